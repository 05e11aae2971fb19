use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// Company names answered from the reference dataset instead of the model.
pub const SPECIAL_CASE_ALIASES: [&str; 4] = ["cuitini", "cuitinni", "kwitini", "quitini"];

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CompanyHandler {
    LlmChain,
    DocumentLookup { dataset: PathBuf },
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct SpecialCaseRoute {
    aliases: BTreeSet<String>,
    dataset: PathBuf,
}

/// Maps a company name to the handler that serves it.
///
/// Names are matched after trimming and lowercasing. A name that matches no route goes to the
/// model chain.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CompanyRouter {
    routes: Vec<SpecialCaseRoute>,
}

impl CompanyRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Router with the built-in alias set pointed at `dataset`.
    pub fn with_special_case_dataset(dataset: impl AsRef<Path>) -> Self {
        Self::new().with_route(SPECIAL_CASE_ALIASES, dataset)
    }

    pub fn with_route<I, S>(mut self, aliases: I, dataset: impl AsRef<Path>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let aliases = aliases.into_iter().map(|alias| normalize(alias.as_ref())).collect();
        self.routes.push(SpecialCaseRoute { aliases, dataset: dataset.as_ref().to_path_buf() });
        self
    }

    pub fn resolve_company_handler(&self, company_name: &str) -> CompanyHandler {
        let normalized = normalize(company_name);
        self.routes
            .iter()
            .find(|route| route.aliases.contains(&normalized))
            .map(|route| CompanyHandler::DocumentLookup { dataset: route.dataset.clone() })
            .unwrap_or(CompanyHandler::LlmChain)
    }
}

fn normalize(value: &str) -> String {
    value.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::{CompanyHandler, CompanyRouter, SPECIAL_CASE_ALIASES};

    fn router() -> CompanyRouter {
        CompanyRouter::with_special_case_dataset("documents/angels.xlsx")
    }

    fn lookup() -> CompanyHandler {
        CompanyHandler::DocumentLookup { dataset: PathBuf::from("documents/angels.xlsx") }
    }

    #[test]
    fn every_alias_routes_to_document_lookup() {
        for name in ["cuitini", "Cuitinni", "KWITINI", "  quitini "] {
            assert_eq!(router().resolve_company_handler(name), lookup(), "alias {name}");
        }
    }

    // Routing is a membership test on the normalized name. Comparing a lowercased name to the
    // whole alias set would never match and would leave the dataset unreachable.
    #[test]
    fn mixed_case_alias_is_a_member_of_the_set() {
        let normalized = "Cuitini".trim().to_lowercase();
        assert!(SPECIAL_CASE_ALIASES.contains(&normalized.as_str()));
        assert_eq!(router().resolve_company_handler("Cuitini"), lookup());
    }

    #[test]
    fn other_companies_use_the_model_chain() {
        for name in ["Acme", "cuitini labs", "cuit", ""] {
            assert_eq!(router().resolve_company_handler(name), CompanyHandler::LlmChain);
        }
    }

    #[test]
    fn empty_router_always_uses_the_model_chain() {
        let router = CompanyRouter::new();
        assert_eq!(router.resolve_company_handler("cuitini"), CompanyHandler::LlmChain);
    }

    #[test]
    fn additional_routes_are_additive() {
        let router = router().with_route(["Globex"], "documents/globex.xlsx");
        assert_eq!(router.resolve_company_handler("kwitini"), lookup());
        assert_eq!(
            router.resolve_company_handler("globex"),
            CompanyHandler::DocumentLookup { dataset: PathBuf::from("documents/globex.xlsx") }
        );
    }
}
