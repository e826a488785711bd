//! Template introspection: which fields does a template actually bind?

use tracing::warn;

use super::{FieldSet, normalize_field_id};
use crate::template::{Template, TemplateNode};

/// Extract the normalized field ids bound by a template, in order of first
/// appearance.
///
/// Unrecognized identifiers are logged and skipped. The result is empty for
/// templates without dynamic fields; callers fall back to the registry.
pub fn introspect(template: &Template) -> FieldSet {
    let mut set = FieldSet::default();
    template.walk(|node| {
        if let TemplateNode::DynamicField(binding) = node {
            match normalize_field_id(&binding.field) {
                Some(field) => {
                    set.insert(field);
                }
                None => warn!(
                    template = %template.component_id(),
                    field = %binding.field,
                    "skipping unrecognized field binding"
                ),
            }
        }
    });
    set
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::FieldId;
    use crate::template::NodeStyle;

    fn field(id: &str) -> TemplateNode {
        TemplateNode::field(id, NodeStyle::default())
    }

    #[test]
    fn test_mixed_vocabularies_collapse() {
        let template = Template::new("oferta", "porcentaje", 600.0, 850.0)
            .node(field("producto.nombre"))
            .node(field("price"))
            .node(field("precioActual"))
            .node(field("field:sku"));
        let ids: Vec<_> = introspect(&template).ids().collect();
        assert_eq!(ids, vec![FieldId::Nombre, FieldId::PrecioActual, FieldId::Sap]);
    }

    #[test]
    fn test_unknown_bindings_are_skipped_not_fatal() {
        let template = Template::new("oferta", "porcentaje", 600.0, 850.0)
            .node(field("colorFavorito"))
            .node(field("nombre"))
            .node(field(""));
        let ids: Vec<_> = introspect(&template).ids().collect();
        assert_eq!(ids, vec![FieldId::Nombre]);
    }

    #[test]
    fn test_static_nodes_bind_nothing() {
        let template = Template::new("oferta", "porcentaje", 600.0, 850.0)
            .node(TemplateNode::text("OFERTA", NodeStyle::default()))
            .node(TemplateNode::group(vec![], NodeStyle::default()));
        assert!(introspect(&template).is_empty());
    }
}
