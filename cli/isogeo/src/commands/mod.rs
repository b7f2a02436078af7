mod catalogs;
mod check;
mod search;

use anyhow::Result;
use bpaf::Bpaf;
use isogeo_api::IsogeoClient;

use crate::config::Config;

fn vec_len<T>(x: Vec<T>) -> usize {
    Vec::len(&x)
}

#[derive(Bpaf, Clone, Copy, Debug)]
pub enum Verbosity {
    Verbose(
        /// Increase logging verbosity
        ///
        /// Invoke multiple times for increasing detail.
        #[bpaf(short('v'), long("verbose"), req_flag(()), many, map(vec_len))]
        usize,
    ),

    /// Silence logs except for errors
    #[bpaf(short, long)]
    Quiet,
}

impl Default for Verbosity {
    fn default() -> Self {
        Verbosity::Verbose(0)
    }
}

/// Command line client of the Isogeo API
#[derive(Debug, Bpaf)]
#[bpaf(options, version)]
pub struct IsogeoArgs {
    #[bpaf(external, fallback(Default::default()))]
    pub verbosity: Verbosity,

    #[bpaf(external(commands))]
    command: Commands,
}

#[derive(Debug, Bpaf, Clone)]
enum Commands {
    /// Check and normalize a resource identifier
    #[bpaf(command("check-id"))]
    CheckId(#[bpaf(external(check::check_id))] check::CheckId),

    /// Check a search query and show its filters
    #[bpaf(command("parse-query"))]
    ParseQuery(#[bpaf(external(check::parse_query))] check::ParseQuery),

    /// Show the resolved configuration
    #[bpaf(command("config"))]
    ShowConfig,

    /// Show the version of the API
    #[bpaf(command("api-version"))]
    ApiVersion,

    /// List the catalogs of a workgroup
    #[bpaf(command)]
    Catalogs(#[bpaf(external(catalogs::catalogs))] catalogs::Catalogs),

    /// Create a catalog unless one with the same name exists
    #[bpaf(command("create-catalog"))]
    CreateCatalog(#[bpaf(external(catalogs::create_catalog))] catalogs::CreateCatalog),

    /// Search the metadata shared with the application
    #[bpaf(command)]
    Search(#[bpaf(external(search::search))] search::Search),

    /// Search the keywords of a thesaurus
    #[bpaf(command)]
    Keywords(#[bpaf(external(search::keywords))] search::Keywords),
}

impl IsogeoArgs {
    pub async fn handle(self, config: Config) -> Result<()> {
        match self.command {
            Commands::CheckId(args) => args.handle(),
            Commands::ParseQuery(args) => args.handle(),
            Commands::ShowConfig => {
                println!("{}", serde_json::to_string_pretty(&config)?);
                Ok(())
            },
            Commands::ApiVersion => {
                let client = IsogeoClient::new(config.client_config()?)?;
                println!("{}", client.api_version().await?);
                Ok(())
            },
            Commands::Catalogs(args) => args.handle(client(&config).await?).await,
            Commands::CreateCatalog(args) => args.handle(client(&config).await?).await,
            Commands::Search(args) => args.handle(client(&config).await?).await,
            Commands::Keywords(args) => args.handle(client(&config).await?).await,
        }
    }
}

/// An authenticated client.
async fn client(config: &Config) -> Result<IsogeoClient> {
    let client = IsogeoClient::new(config.client_config()?)?;
    client.connect().await?;
    Ok(client)
}
