use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use crate::error::{RdcfError, Result};
use crate::services::name_resolver::{NameMatch, NameResolver};

/// One row of the reference company list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Company {
    pub name: String,
    /// Provider identifier used to request financials
    #[serde(alias = "slug")]
    pub identifier: String,
}

impl Company {
    pub fn new(name: impl Into<String>, identifier: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            identifier: identifier.into(),
        }
    }
}

/// Immutable lookup table of known companies, built once at startup.
#[derive(Debug, Clone, Default)]
pub struct CompanyDirectory {
    companies: Vec<Company>,
    names: Vec<String>,
    by_name: HashMap<String, usize>,
}

impl CompanyDirectory {
    pub fn new(companies: Vec<Company>) -> Self {
        let names: Vec<String> = companies.iter().map(|c| c.name.clone()).collect();
        let mut by_name = HashMap::with_capacity(companies.len());
        for (idx, name) in names.iter().enumerate() {
            // First row wins for duplicate names
            by_name.entry(name.clone()).or_insert(idx);
        }

        Self {
            companies,
            names,
            by_name,
        }
    }

    /// Load from a CSV file with a `name,slug` (or `name,identifier`) header
    pub fn from_csv_path(path: impl AsRef<Path>) -> Result<Self> {
        let reader = csv::Reader::from_path(path.as_ref())?;
        let directory = Self::from_csv(reader)?;
        tracing::info!(
            path = %path.as_ref().display(),
            companies = directory.len(),
            "Loaded company directory"
        );
        Ok(directory)
    }

    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self> {
        Self::from_csv(csv::Reader::from_reader(reader))
    }

    fn from_csv<R: Read>(mut reader: csv::Reader<R>) -> Result<Self> {
        let mut companies = Vec::new();
        for row in reader.deserialize() {
            let company: Company = row?;
            let name = company.name.trim();
            let identifier = company.identifier.trim();
            if name.is_empty() || identifier.is_empty() {
                continue;
            }
            companies.push(Company::new(name, identifier));
        }
        Ok(Self::new(companies))
    }

    pub fn len(&self) -> usize {
        self.companies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.companies.is_empty()
    }

    pub fn companies(&self) -> &[Company] {
        &self.companies
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn get_by_name(&self, name: &str) -> Option<&Company> {
        self.by_name.get(name).map(|&idx| &self.companies[idx])
    }

    pub fn get_by_identifier(&self, identifier: &str) -> Option<&Company> {
        self.companies
            .iter()
            .find(|c| c.identifier.eq_ignore_ascii_case(identifier))
    }

    /// Resolve a free-text query, accepting the best match only when its
    /// score is strictly above `min_score`.
    pub fn resolve(
        &self,
        resolver: &dyn NameResolver,
        query: &str,
        min_score: u8,
    ) -> Result<(Company, u8)> {
        let query = query.trim();
        if query.is_empty() {
            return Err(RdcfError::NoCloseMatch {
                query: query.to_string(),
                best_score: None,
            });
        }

        let best = resolver.resolve(query, &self.names);
        match best {
            Some(NameMatch { name, score }) if score > min_score => {
                let company = self.get_by_name(&name).cloned().ok_or_else(|| {
                    RdcfError::Config(format!("resolver returned unknown name {:?}", name))
                })?;
                tracing::debug!(query, name = %company.name, score, "Resolved company");
                Ok((company, score))
            }
            other => {
                let best_score = other.map(|m| m.score);
                tracing::debug!(query, ?best_score, min_score, "No close match");
                Err(RdcfError::NoCloseMatch {
                    query: query.to_string(),
                    best_score,
                })
            }
        }
    }
}
