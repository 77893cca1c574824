/// One fragment of a relationship link value. A template is rendered in SQL as a `CONCAT`
/// over its fragments, with [`LinkFragment::ResourceId`] splicing in the parent row's primary
/// key at query time.
#[derive(Debug, Clone, PartialEq)]
pub enum LinkFragment {
    Literal(String),
    ResourceId,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct LinkTemplate {
    pub fragments: Vec<LinkFragment>,
}

impl LinkTemplate {
    pub fn new() -> Self {
        Self::default()
    }

    /// A link with a fixed value and no placeholder
    pub fn fixed(value: impl Into<String>) -> Self {
        Self::new().literal(value)
    }

    pub fn literal(mut self, value: impl Into<String>) -> Self {
        self.fragments.push(LinkFragment::Literal(value.into()));
        self
    }

    pub fn resource_id(mut self) -> Self {
        self.fragments.push(LinkFragment::ResourceId);
        self
    }
}

/// Per-relationship serialization configuration. This struct is the constrained replacement
/// for the serializer-block mini-program of JSON:API serializer layers: the only two knobs are
/// whether the relationship carries a `data` member and which `links` it exposes.
#[derive(Debug, Clone, PartialEq)]
pub struct RelationshipConfig {
    pub include_data: bool,
    /// Ordered link name to template pairs
    pub links: Vec<(String, LinkTemplate)>,
}

impl Default for RelationshipConfig {
    fn default() -> Self {
        Self {
            include_data: true,
            links: Vec::new(),
        }
    }
}

impl RelationshipConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn include_data(mut self, include_data: bool) -> Self {
        self.include_data = include_data;
        self
    }

    pub fn link(mut self, name: impl Into<String>, template: LinkTemplate) -> Self {
        self.links.push((name.into(), template));
        self
    }
}
