//! Tera filters and functions over the JSON view of a document.
//!
//! Elements reach templates as objects with `tag`, `kind`, `attrs`,
//! `children` and `text` keys.

use std::{collections::HashMap, path::Path};

use ddsgen_core::{to_pascal_case, to_snake_case, to_upper_snake_case};
use ddsgen_model::Document;
use tera::{Error, Function, Result, Tera, Value};

use super::UriResolver;

pub(crate) fn register(tera: &mut Tera) {
    tera.register_filter("elements", elements);
    tera.register_filter("descendants", descendants);
    tera.register_filter("attr", attr);
    tera.register_filter("snake", snake);
    tera.register_filter("pascal", pascal);
    tera.register_filter("upper_snake", upper_snake);
    tera.register_filter("cxx_type", cxx_type);
    tera.register_filter("dirname", dirname);
}

struct Selector<'a> {
    tag: Option<&'a str>,
    kind: Option<&'a str>,
}

impl<'a> Selector<'a> {
    fn from_args(args: &'a HashMap<String, Value>) -> Self {
        Self {
            tag: args.get("tag").and_then(Value::as_str),
            kind: args.get("type").and_then(Value::as_str),
        }
    }

    fn matches(&self, element: &Value) -> bool {
        self.tag.is_none_or(|tag| element["tag"] == tag)
            && self.kind.is_none_or(|kind| element["kind"] == kind)
    }
}

/// Elements a filter starts from: one element or a list of them.
fn roots(value: &Value) -> Result<Vec<&Value>> {
    match value {
        Value::Array(items) => Ok(items.iter().collect()),
        Value::Object(_) => Ok(vec![value]),
        other => Err(Error::msg(format!("expected an element, found {other}"))),
    }
}

fn children(element: &Value) -> impl Iterator<Item = &Value> {
    element["children"].as_array().into_iter().flatten()
}

/// `{{ model | elements(tag="libs", type="DataLib") }}`: matching direct children.
pub fn elements(value: &Value, args: &HashMap<String, Value>) -> Result<Value> {
    let selector = Selector::from_args(args);
    let mut found = Vec::new();
    for root in roots(value)? {
        found.extend(children(root).filter(|e| selector.matches(e)).cloned());
    }
    Ok(Value::Array(found))
}

/// Matching elements anywhere below, in document order.
pub fn descendants(value: &Value, args: &HashMap<String, Value>) -> Result<Value> {
    fn walk(element: &Value, selector: &Selector<'_>, found: &mut Vec<Value>) {
        for child in children(element) {
            if selector.matches(child) {
                found.push(child.clone());
            }
            walk(child, selector, found);
        }
    }

    let selector = Selector::from_args(args);
    let mut found = Vec::new();
    for root in roots(value)? {
        walk(root, &selector, &mut found);
    }
    Ok(Value::Array(found))
}

/// `{{ field | attr(name="type", default="long") }}`
pub fn attr(value: &Value, args: &HashMap<String, Value>) -> Result<Value> {
    let name = args
        .get("name")
        .and_then(Value::as_str)
        .ok_or_else(|| Error::msg("attr filter requires a `name` argument"))?;
    match value["attrs"].get(name) {
        Some(found) => Ok(found.clone()),
        None => Ok(args
            .get("default")
            .cloned()
            .unwrap_or_else(|| Value::String(String::new()))),
    }
}

fn string_filter(value: &Value, name: &str, f: impl Fn(&str) -> String) -> Result<Value> {
    value
        .as_str()
        .map(|s| Value::String(f(s)))
        .ok_or_else(|| Error::msg(format!("{name} filter requires a string")))
}

pub fn snake(value: &Value, _args: &HashMap<String, Value>) -> Result<Value> {
    string_filter(value, "snake", to_snake_case)
}

pub fn pascal(value: &Value, _args: &HashMap<String, Value>) -> Result<Value> {
    string_filter(value, "pascal", to_pascal_case)
}

pub fn upper_snake(value: &Value, _args: &HashMap<String, Value>) -> Result<Value> {
    string_filter(value, "upper_snake", to_upper_snake_case)
}

/// Map a model primitive type name to its C++ mapping.
pub fn cxx_type(value: &Value, _args: &HashMap<String, Value>) -> Result<Value> {
    string_filter(value, "cxx_type", |name| {
        match name {
            "boolean" => "CORBA::Boolean",
            "char" => "CORBA::Char",
            "wchar" => "CORBA::WChar",
            "octet" => "CORBA::Octet",
            "short" => "CORBA::Short",
            "unsigned short" | "ushort" => "CORBA::UShort",
            "long" => "CORBA::Long",
            "unsigned long" | "ulong" => "CORBA::ULong",
            "long long" | "longlong" => "CORBA::LongLong",
            "unsigned long long" | "ulonglong" => "CORBA::ULongLong",
            "float" => "CORBA::Float",
            "double" => "CORBA::Double",
            "long double" => "CORBA::LongDouble",
            "string" => "TAO::String_Manager",
            "wstring" => "TAO::WString_Manager",
            other => return other.replace('.', "::"),
        }
        .to_string()
    })
}

/// Directory part of a relative location; `.` when there is none.
pub fn dirname(value: &Value, _args: &HashMap<String, Value>) -> Result<Value> {
    string_filter(value, "dirname", |location| {
        match Path::new(location).parent() {
            Some(parent) if !parent.as_os_str().is_empty() => {
                parent.to_string_lossy().replace('\\', "/")
            }
            _ => ".".to_string(),
        }
    })
}

/// `document(path="shared.opendds")`: load another document through the
/// template's URI resolver and return its JSON view.
pub(crate) struct DocumentFunction {
    uri: UriResolver,
}

impl DocumentFunction {
    pub(crate) fn new(uri: UriResolver) -> Self {
        Self { uri }
    }
}

impl Function for DocumentFunction {
    fn call(&self, args: &HashMap<String, Value>) -> Result<Value> {
        let name = args
            .get("path")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::msg("document() requires a `path` argument"))?;
        let (resource, content) = self
            .uri
            .read(name)
            .map_err(|e| Error::msg(e.to_string()))?;
        let document =
            Document::parse(&content, resource.path()).map_err(|e| Error::msg(e.to_string()))?;
        Ok(document.to_json())
    }

    fn is_safe(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use std::{fs, sync::Arc};

    use ddsgen_core::FsFileProvider;
    use serde_json::json;
    use tempfile::TempDir;

    use super::*;

    fn model() -> Value {
        Document::parse(
            r#"<opendds:OpenDDSModel name="Demo">
                 <libs xsi:type="types:DataLib" name="Types">
                   <types xsi:type="types:Struct" name="Message">
                     <fields name="id" type="long"/>
                     <fields name="text" type="string"/>
                   </types>
                 </libs>
                 <libs xsi:type="opendds:DcpsLib" name="Dcps"/>
               </opendds:OpenDDSModel>"#,
            "demo.opendds",
        )
        .unwrap()
        .to_json()
    }

    fn args(pairs: &[(&str, &str)]) -> HashMap<String, Value> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), json!(v)))
            .collect()
    }

    #[test]
    fn test_elements_by_tag_and_type() {
        let libs = elements(&model(), &args(&[("tag", "libs"), ("type", "DataLib")])).unwrap();
        let libs = libs.as_array().unwrap();

        assert_eq!(libs.len(), 1);
        assert_eq!(libs[0]["attrs"]["name"], "Types");
    }

    #[test]
    fn test_descendants_over_list() {
        let libs = elements(&model(), &args(&[("tag", "libs")])).unwrap();
        let fields = descendants(&libs, &args(&[("tag", "fields")])).unwrap();
        let names: Vec<_> = fields
            .as_array()
            .unwrap()
            .iter()
            .map(|f| f["attrs"]["name"].as_str().unwrap())
            .collect();

        assert_eq!(names, vec!["id", "text"]);
    }

    #[test]
    fn test_attr_default() {
        let m = model();
        assert_eq!(attr(&m, &args(&[("name", "name")])).unwrap(), "Demo");
        assert_eq!(
            attr(&m, &args(&[("name", "missing"), ("default", "x")])).unwrap(),
            "x"
        );
        assert!(attr(&m, &HashMap::new()).is_err());
    }

    #[test]
    fn test_case_filters() {
        let none = HashMap::new();
        assert_eq!(snake(&json!("MessageType"), &none).unwrap(), "message_type");
        assert_eq!(pascal(&json!("message_type"), &none).unwrap(), "MessageType");
        assert_eq!(upper_snake(&json!("DemoTraits.h"), &none).unwrap(), "DEMO_TRAITS_H");
        assert!(snake(&json!(3), &none).is_err());
    }

    #[test]
    fn test_cxx_type() {
        let none = HashMap::new();
        assert_eq!(cxx_type(&json!("long"), &none).unwrap(), "CORBA::Long");
        assert_eq!(cxx_type(&json!("string"), &none).unwrap(), "TAO::String_Manager");
        assert_eq!(cxx_type(&json!("Demo.Message"), &none).unwrap(), "Demo::Message");
    }

    #[test]
    fn test_dirname() {
        let none = HashMap::new();
        assert_eq!(dirname(&json!("shared/types.opendds"), &none).unwrap(), "shared");
        assert_eq!(dirname(&json!("types.opendds"), &none).unwrap(), ".");
        assert_eq!(dirname(&json!("a/b/c.opendds"), &none).unwrap(), "a/b");
    }

    #[test]
    fn test_document_function() {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join("shared.opendds"),
            r#"<opendds:OpenDDSModel name="Shared"/>"#,
        )
        .unwrap();
        let provider = Arc::new(FsFileProvider::new(temp.path(), temp.path().join("bundle")));
        let function =
            DocumentFunction::new(UriResolver::new(provider, "opendds").with_model_dir(temp.path()));

        let doc = function.call(&args(&[("path", "shared.opendds")])).unwrap();
        assert_eq!(doc["attrs"]["name"], "Shared");
        assert!(function.call(&args(&[("path", "gone.opendds")])).is_err());
    }
}
