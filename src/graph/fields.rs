use crate::serializer::{SerializationContext, SerializerType};

/// The fields one node renders: attribute names and relationship names, each in the order
/// they will appear in the document.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SelectedFields {
    pub attributes: Vec<String>,
    pub relationships: Vec<String>,
}

/// Select which of a serializer's fields a request sees. The serializer's declarations are
/// filtered by their include predicates; an explicit sparse-fieldset list then restricts the
/// result and supplies the order. A field listed explicitly but not exposed by the serializer
/// is silently dropped, matching the JSON:API expectation that sparse fieldsets can only
/// narrow.
pub fn selected_fields(
    serializer: &SerializerType,
    explicit: Option<&[String]>,
    context: &SerializationContext,
) -> SelectedFields {
    let exposed = |declared: &[String]| -> Vec<String> {
        declared
            .iter()
            .filter(|name| serializer.include_field(name, context))
            .cloned()
            .collect()
    };
    let attributes = exposed(&serializer.attributes);
    let relationships = exposed(&serializer.relationships);

    match explicit {
        Some(list) => SelectedFields {
            attributes: list
                .iter()
                .filter(|field| attributes.iter().any(|a| a == *field))
                .cloned()
                .collect(),
            relationships: list
                .iter()
                .filter(|field| relationships.iter().any(|r| r == *field))
                .cloned()
                .collect(),
        },
        None => SelectedFields {
            attributes,
            relationships,
        },
    }
}
