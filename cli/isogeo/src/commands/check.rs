use anyhow::Result;
use bpaf::Bpaf;
use indoc::formatdoc;
use isogeo_api::{normalize_query, IsogeoUuid};

#[derive(Debug, Bpaf, Clone)]
pub struct CheckId {
    /// Identifier, hexadecimal or 'isogeo:metadata:<hex>'
    #[bpaf(positional("ID"))]
    pub id: String,
}

impl CheckId {
    pub fn handle(self) -> Result<()> {
        let uuid: IsogeoUuid = self.id.parse()?;
        println!("{}", formatdoc! {"
            identifier: {canonical}
            urn:        {urn}
            platform:   {platform}",
            canonical = uuid.simple(),
            urn = uuid.urn(),
            platform = uuid.platform_urn(),
        });
        Ok(())
    }
}

#[derive(Debug, Bpaf, Clone)]
pub struct ParseQuery {
    /// Filters and words, e.g. 'type:dataset owner:<id> roads'
    #[bpaf(positional("QUERY"))]
    pub query: String,
}

impl ParseQuery {
    pub fn handle(self) -> Result<()> {
        let buckets = normalize_query(&self.query)?;
        for (category, values) in buckets.iter() {
            if values.is_empty() {
                continue;
            }
            println!("{category}: {}", values.join(" "));
        }
        Ok(())
    }
}
