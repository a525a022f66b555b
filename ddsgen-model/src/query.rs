//! Structural queries over model documents.

use std::collections::BTreeSet;

use crate::{Document, Element, Error, Result};

/// Local name of the model root element.
pub const MODEL_ELEMENT: &str = "OpenDDSModel";

/// Query string reported when the model name is missing or ambiguous.
pub const MODEL_NAME_QUERY: &str = "//OpenDDSModel/@name";

/// Attribute naming a transport on publishers and subscribers.
pub const TRANSPORT_ATTR: &str = "transportId";

/// `xsi:type` of a data library declaration.
pub const DATA_LIB_TYPE: &str = "DataLib";

/// The model's name.
///
/// Exactly one named `OpenDDSModel` element must exist anywhere in the tree;
/// zero or several matches yield a cardinality error.
pub fn model_name(doc: &Document) -> Result<String> {
    let names: Vec<&str> = doc
        .root()
        .find_all(MODEL_ELEMENT)
        .filter_map(|e| e.attr("name"))
        .collect();
    match names.as_slice() {
        [name] => Ok((*name).to_string()),
        other => Err(Error::cardinality(MODEL_NAME_QUERY, other.len())),
    }
}

/// Distinct transport identifiers referenced anywhere in the document.
pub fn transport_ids(doc: &Document) -> BTreeSet<String> {
    doc.root()
        .iter()
        .filter_map(|e| e.attr(TRANSPORT_ATTR))
        .map(str::to_string)
        .collect()
}

/// Data library declarations (resolved or still referenced).
pub fn data_libraries(doc: &Document) -> impl Iterator<Item = &Element> {
    doc.root()
        .find_all("libs")
        .filter(|e| e.xsi_type() == Some(DATA_LIB_TYPE))
}

/// Whether the model declares at least one data library.
pub fn has_data_library(doc: &Document) -> bool {
    data_libraries(doc).next().is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(src: &str) -> Document {
        Document::parse(src, "test.opendds").unwrap()
    }

    #[test]
    fn test_model_name_single_match() {
        let d = doc(r#"<opendds:OpenDDSModel name="Foo"/>"#);
        assert_eq!(model_name(&d).unwrap(), "Foo");
    }

    #[test]
    fn test_model_name_zero_matches() {
        let d = doc(r#"<opendds:OpenDDSModel/>"#);
        let err = model_name(&d).unwrap_err();
        assert!(matches!(*err, Error::QueryCardinality { count: 0, .. }));
    }

    #[test]
    fn test_model_name_multiple_matches() {
        let d = doc(
            r#"<root>
                <opendds:OpenDDSModel name="A"/>
                <opendds:OpenDDSModel name="B"/>
            </root>"#,
        );
        let err = model_name(&d).unwrap_err();
        assert!(matches!(*err, Error::QueryCardinality { count: 2, .. }));
    }

    #[test]
    fn test_transport_ids_are_distinct() {
        let d = doc(
            r#"<opendds:OpenDDSModel name="Demo">
                <libs>
                  <participants>
                    <publishers transportId="3"/>
                    <subscribers transportId="1"/>
                    <publishers transportId="3"/>
                  </participants>
                </libs>
            </opendds:OpenDDSModel>"#,
        );
        let ids: Vec<_> = transport_ids(&d).into_iter().collect();
        assert_eq!(ids, vec!["1", "3"]);
    }

    #[test]
    fn test_has_data_library() {
        let with = doc(
            r#"<m:OpenDDSModel xmlns:xsi="x" name="D"><libs xsi:type="types:DataLib" name="T"/></m:OpenDDSModel>"#,
        );
        let without = doc(
            r#"<m:OpenDDSModel xmlns:xsi="x" name="D"><libs xsi:type="opendds:DcpsLib" name="P"/></m:OpenDDSModel>"#,
        );

        assert!(has_data_library(&with));
        assert!(!has_data_library(&without));
    }
}
