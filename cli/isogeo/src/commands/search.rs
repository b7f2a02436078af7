use anyhow::Result;
use bpaf::Bpaf;
use isogeo_api::{Includes, IsogeoClient, SearchParameters};
use tracing::{debug, instrument};

const DEFAULT_PAGE_SIZE: u64 = 20;

#[derive(Debug, Bpaf, Clone)]
pub struct Search {
    /// Number of results to show
    #[bpaf(long("page-size"), argument("N"), fallback(DEFAULT_PAGE_SIZE))]
    pub page_size: u64,

    /// Print all search results
    #[bpaf(short, long)]
    pub all: bool,

    /// Subresources to include, 'all' for every one
    #[bpaf(long, argument("SUBRESOURCE"), many)]
    pub include: Vec<String>,

    /// Display search results as a JSON array
    #[bpaf(long)]
    pub json: bool,

    /// Filters and words, e.g. 'type:dataset roads'
    #[bpaf(positional("QUERY"), fallback(String::new()))]
    pub query: String,
}

impl Search {
    fn params(&self) -> SearchParameters {
        let include = if self.include.iter().any(|i| i == "all") {
            Includes::All
        } else if self.include.is_empty() {
            Includes::None
        } else {
            Includes::of(self.include.iter().cloned())
        };
        SearchParameters {
            page_size: self.page_size,
            include,
            ..SearchParameters::with_query(&self.query)
        }
    }

    #[instrument(name = "search", skip_all, fields(query = self.query, all = self.all))]
    pub async fn handle(self, client: IsogeoClient) -> Result<()> {
        let params = self.params();
        let (total, results) = if self.all {
            client.search_all(&params, None).await?
        } else {
            let page = client.search(&params).await?;
            (page.total, page.results)
        };
        debug!(total, shown = results.len(), "search done");

        if self.json {
            println!("{}", serde_json::to_string_pretty(&results)?);
            return Ok(());
        }
        for md in &results {
            println!(
                "{}  {}",
                md.id.map(|id| id.to_string()).unwrap_or_default(),
                md.title_or_name().unwrap_or_default()
            );
        }
        eprintln!("{} of {total} metadata", results.len());
        Ok(())
    }
}

#[derive(Debug, Bpaf, Clone)]
pub struct Keywords {
    /// Thesaurus to search
    #[bpaf(long, short, argument("THESAURUS"))]
    pub thesaurus: String,

    /// Number of results to show
    #[bpaf(long("page-size"), argument("N"), fallback(DEFAULT_PAGE_SIZE))]
    pub page_size: u64,

    #[bpaf(positional("QUERY"), fallback(String::new()))]
    pub query: String,
}

impl Keywords {
    #[instrument(name = "keywords", skip_all, fields(thesaurus = self.thesaurus))]
    pub async fn handle(self, client: IsogeoClient) -> Result<()> {
        let page = client
            .search_keywords(&self.thesaurus, &self.query, self.page_size, 0)
            .await?;
        for keyword in &page.results {
            println!("{}", keyword.text.as_deref().unwrap_or_default());
        }
        eprintln!("{} of {} keywords", page.results.len(), page.total);
        Ok(())
    }
}
