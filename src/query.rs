use anyhow::Result;

use crate::client::Resolwe;
use crate::error::ResolweError;
use crate::model::Sample;

/// Resolver for `/api/sample`, reached through [`Resolwe::sample`].
pub struct SampleQuery<'a> {
    resolwe: &'a Resolwe,
}

impl<'a> SampleQuery<'a> {
    pub(crate) fn new(resolwe: &'a Resolwe) -> Self {
        Self { resolwe }
    }

    /// Fetches the single sample matching `slug`.
    ///
    /// Fails with [`ResolweError::NotFound`] when nothing matches and with
    /// [`ResolweError::Ambiguous`] when the server reports more than one
    /// match (slugs are unique, but the server is the authority).
    pub fn get(&self, slug: &str) -> Result<Sample> {
        let mut matches = self.filter(&[("slug", slug)])?;

        if matches.len() > 1 {
            return Err(ResolweError::Ambiguous {
                slug: slug.to_string(),
                matches: matches.len(),
            }
            .into());
        }

        match matches.pop() {
            Some(sample) => Ok(sample),
            None => Err(ResolweError::NotFound {
                slug: slug.to_string(),
            }
            .into()),
        }
    }

    /// Lists all samples matching the given filter parameters,
    /// e.g. `&[("tags", "community:rna-seq")]`.
    pub fn filter(&self, params: &[(&str, &str)]) -> Result<Vec<Sample>> {
        self.resolwe.api_get("api/sample", params)
    }
}
