use anyhow::Result;
use bpaf::Bpaf;
use isogeo_api::models::Catalog;
use isogeo_api::{Created, ExistenceCheck, Includes, IsogeoClient};
use tracing::{info, instrument};

#[derive(Debug, Bpaf, Clone)]
pub struct Catalogs {
    /// Workgroup owning the catalogs
    #[bpaf(long, short, argument("WORKGROUP"))]
    pub workgroup: String,

    /// Display the catalogs as a JSON array
    #[bpaf(long)]
    pub json: bool,
}

impl Catalogs {
    #[instrument(name = "catalogs", skip_all, fields(workgroup = self.workgroup))]
    pub async fn handle(self, client: IsogeoClient) -> Result<()> {
        let catalogs = client
            .list::<Catalog>(&self.workgroup, &Includes::None, false)
            .await?;
        if self.json {
            println!("{}", serde_json::to_string_pretty(&catalogs)?);
            return Ok(());
        }
        for catalog in catalogs {
            println!(
                "{}  {}",
                catalog.id.map(|id| id.to_string()).unwrap_or_default(),
                catalog.name.unwrap_or_default()
            );
        }
        Ok(())
    }
}

#[derive(Debug, Bpaf, Clone)]
pub struct CreateCatalog {
    /// Workgroup owning the catalog
    #[bpaf(long, short, argument("WORKGROUP"))]
    pub workgroup: String,

    /// Short code of the catalog
    #[bpaf(long, argument("CODE"))]
    pub code: Option<String>,

    /// Create the catalog even if one with the same name exists
    #[bpaf(long("no-check"))]
    pub no_check: bool,

    #[bpaf(positional("NAME"))]
    pub name: String,
}

impl CreateCatalog {
    #[instrument(name = "create-catalog", skip_all, fields(workgroup = self.workgroup, name = self.name))]
    pub async fn handle(self, client: IsogeoClient) -> Result<()> {
        let check = if self.no_check {
            ExistenceCheck::Skip
        } else {
            ExistenceCheck::Check
        };
        let catalog = Catalog {
            code: self.code,
            ..Catalog::new(&self.name)
        };

        match client.create(&self.workgroup, &catalog, check).await? {
            Created::New(created) => {
                info!("catalog created");
                println!(
                    "created '{}' ({})",
                    self.name,
                    created.id.map(|id| id.to_string()).unwrap_or_default()
                );
            },
            Created::AlreadyExists { id } => {
                println!("'{}' already exists ({id})", self.name);
            },
        }
        Ok(())
    }
}
