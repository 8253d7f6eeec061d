use config::{AccessLevel, GroupFilterConfig};

/// Query parameters of the group listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupFilter {
    pub owned_only: bool,
    pub top_level_only: bool,
    /// `None` lists groups regardless of the access level.
    pub min_access_level: Option<u8>,
    pub search: Option<String>,
    pub per_page: u32,
}

impl Default for GroupFilter {
    fn default() -> Self {
        Self::from(&GroupFilterConfig::default())
    }
}

impl From<&GroupFilterConfig> for GroupFilter {
    fn from(config: &GroupFilterConfig) -> Self {
        let min_access_level =
            (config.min_access_level > AccessLevel::Minimal).then(|| config.min_access_level.as_u8());

        Self {
            owned_only: config.owned_only,
            top_level_only: config.top_level_only,
            min_access_level,
            search: config.name.clone().filter(|name| !name.is_empty()),
            per_page: config.limit,
        }
    }
}

impl GroupFilter {
    /// Only the first page is ever requested; `per_page` bounds the number of groups.
    pub fn query(&self) -> Vec<(&'static str, String)> {
        let mut query = vec![("page", "1".to_string()), ("per_page", self.per_page.to_string())];

        if self.owned_only {
            query.push(("owned", "true".to_string()));
        }

        if self.top_level_only {
            query.push(("top_level_only", "true".to_string()));
        }

        if let Some(level) = self.min_access_level {
            query.push(("min_access_level", level.to_string()));
        }

        if let Some(ref search) = self.search {
            query.push(("search", search.clone()));
        }

        query
    }
}

#[cfg(test)]
mod tests {
    use config::{AccessLevel, GroupFilterConfig};
    use insta::assert_debug_snapshot;

    use super::GroupFilter;

    #[test]
    fn default_filter_only_paginates() {
        assert_debug_snapshot!(GroupFilter::default().query(), @r#"
        [
            (
                "page",
                "1",
            ),
            (
                "per_page",
                "20",
            ),
        ]
        "#);
    }

    #[test]
    fn every_option() {
        let config = GroupFilterConfig {
            owned_only: true,
            top_level_only: true,
            min_access_level: AccessLevel::Maintainer,
            name: Some("infra".to_string()),
            limit: 5,
        };

        assert_debug_snapshot!(GroupFilter::from(&config).query(), @r#"
        [
            (
                "page",
                "1",
            ),
            (
                "per_page",
                "5",
            ),
            (
                "owned",
                "true",
            ),
            (
                "top_level_only",
                "true",
            ),
            (
                "min_access_level",
                "40",
            ),
            (
                "search",
                "infra",
            ),
        ]
        "#);
    }

    #[test]
    fn empty_name_is_no_search() {
        let config = GroupFilterConfig {
            name: Some(String::new()),
            ..Default::default()
        };

        assert_eq!(GroupFilter::from(&config).search, None);
    }
}
