use std::{convert::Infallible, fmt, str::FromStr};

use crate::adapters::TreeFilter;

/// Catalogue views served by the `jsontree` endpoint.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Default)]
pub enum JrdsTreeFilter {
    #[default]
    HostsTab,
    TagsTab,
    FilterTab,
    ServicesTab,
    ViewsTab,
    /// Any other `tab` value understood by the server.
    Custom(String),
}

impl JrdsTreeFilter {
    pub fn command(&self) -> &str {
        match self {
            JrdsTreeFilter::HostsTab => "hoststab",
            JrdsTreeFilter::TagsTab => "tagstab",
            JrdsTreeFilter::FilterTab => "filtertab",
            JrdsTreeFilter::ServicesTab => "servicestab",
            JrdsTreeFilter::ViewsTab => "viewstab",
            JrdsTreeFilter::Custom(command) => command,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            JrdsTreeFilter::HostsTab => "All Hosts",
            JrdsTreeFilter::TagsTab => "All Tags",
            JrdsTreeFilter::FilterTab => "All Filters",
            JrdsTreeFilter::ServicesTab => "All Services",
            JrdsTreeFilter::ViewsTab => "All Views",
            JrdsTreeFilter::Custom(command) => command,
        }
    }
}

impl FromStr for JrdsTreeFilter {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Ok(match s.to_ascii_lowercase().as_str() {
            "hoststab" => JrdsTreeFilter::HostsTab,
            "tagstab" => JrdsTreeFilter::TagsTab,
            "filtertab" => JrdsTreeFilter::FilterTab,
            "servicestab" => JrdsTreeFilter::ServicesTab,
            "viewstab" => JrdsTreeFilter::ViewsTab,
            _ => JrdsTreeFilter::Custom(s.to_string()),
        })
    }
}

impl fmt::Display for JrdsTreeFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl From<&JrdsTreeFilter> for TreeFilter {
    fn from(filter: &JrdsTreeFilter) -> Self {
        TreeFilter::new(filter.command())
    }
}

impl From<JrdsTreeFilter> for TreeFilter {
    fn from(filter: JrdsTreeFilter) -> Self {
        TreeFilter::from(&filter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_and_custom_tabs() {
        assert_eq!("TagsTab".parse::<JrdsTreeFilter>().unwrap(), JrdsTreeFilter::TagsTab);
        assert_eq!(
            " mytab ".parse::<JrdsTreeFilter>().unwrap(),
            JrdsTreeFilter::Custom("mytab".into())
        );
        assert_eq!(TreeFilter::from(JrdsTreeFilter::ViewsTab).command(), "viewstab");
        assert_eq!(JrdsTreeFilter::default().to_string(), "All Hosts");
    }
}
