//! SOAP 1.1 framing and namespace-tolerant result extraction.
//!
//! Responses from .NET DataSet services embed an `xs:schema` block next to
//! the data. Element lookups here match on local names only and never descend
//! into a `schema` subtree, so schema declarations cannot shadow data nodes.

use std::fmt::Write as _;

use roxmltree::{Document, Node};
use thiserror::Error;

use crate::{ProviderId, RateError};

pub const SOAP11_NAMESPACE: &str = "http://schemas.xmlsoap.org/soap/envelope/";
pub const SOAP12_NAMESPACE: &str = "http://www.w3.org/2003/05/soap-envelope";

const SCHEMA_NODE: &str = "schema";
const DEFAULT_FAULT_CODE: &str = "Server";
const DEFAULT_FAULT_MESSAGE: &str = "Unknown SOAP fault.";

#[derive(Debug, Error)]
pub enum SoapError {
    #[error("unable to parse {context} SOAP response")]
    Parse {
        context: String,
        #[source]
        source: roxmltree::Error,
    },
    #[error("SOAP fault ({code}): {message}")]
    Fault { code: String, message: String },
    #[error("missing SOAP result node for {action} response")]
    MissingResult { action: String },
    #[error("missing {node} dataset inside {action} response")]
    MissingDataset { action: String, node: String },
}

impl SoapError {
    /// Attaches the provider and maps onto the shared error taxonomy.
    pub fn into_rate_error(self, provider: ProviderId) -> RateError {
        match self {
            Self::Parse { context, source } => RateError::invalid_response_with(
                provider,
                format!("unable to parse {context} SOAP response"),
                source,
            ),
            Self::Fault { code, message } => RateError::ProtocolFault {
                provider,
                code,
                message,
            },
            Self::MissingResult { action } => RateError::MissingResult { provider, action },
            Self::MissingDataset { action, node } => RateError::MissingDataset {
                provider,
                action,
                node,
            },
        }
    }
}

/// Builds a SOAP 1.1 envelope whose body holds `<action xmlns=namespace>` with
/// one child element per parameter.
pub fn build_envelope(action: &str, namespace: &str, parameters: &[(&str, &str)]) -> String {
    let mut payload = format!(r#"<{action} xmlns="{namespace}">"#);
    for (name, value) in parameters {
        let _ = write!(payload, "<{name}>{}</{name}>", escape_xml(value));
    }
    let _ = write!(payload, "</{action}>");

    format!(
        concat!(
            r#"<?xml version="1.0" encoding="utf-8"?>"#,
            r#"<soap:Envelope xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" "#,
            r#"xmlns:xsd="http://www.w3.org/2001/XMLSchema" xmlns:soap="{soap}">"#,
            "<soap:Body>{payload}</soap:Body>",
            "</soap:Envelope>"
        ),
        soap = SOAP11_NAMESPACE,
        payload = payload
    )
}

/// Escapes text content and double-quoted attribute values.
pub fn escape_xml(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            other => escaped.push(other),
        }
    }
    escaped
}

pub fn parse_document<'input>(
    body: &'input str,
    context: &str,
) -> Result<Document<'input>, SoapError> {
    Document::parse(body.trim()).map_err(|source| SoapError::Parse {
        context: context.to_owned(),
        source,
    })
}

/// Locates `{action}Response/{action}Result` inside the envelope body.
///
/// A `Fault` in the body wins over any result that may also be present.
pub fn unwrap_result<'a, 'input>(
    document: &'a Document<'input>,
    action: &str,
) -> Result<Node<'a, 'input>, SoapError> {
    let missing = || SoapError::MissingResult {
        action: action.to_owned(),
    };

    let body = soap_body(document).ok_or_else(missing)?;
    check_fault(body)?;

    let response = element_child(body, &format!("{action}Response")).ok_or_else(missing)?;
    element_child(response, &format!("{action}Result")).ok_or_else(missing)
}

/// Returns the fault carried by `document`, if any.
pub fn detect_fault(document: &Document<'_>) -> Option<SoapError> {
    soap_body(document).and_then(|body| check_fault(body).err())
}

/// The envelope body under SOAP 1.1, then SOAP 1.2, then any `Body` child.
pub fn soap_body<'a, 'input>(document: &'a Document<'input>) -> Option<Node<'a, 'input>> {
    let envelope = document.root_element();

    namespaced_child(envelope, SOAP11_NAMESPACE, "Body")
        .or_else(|| namespaced_child(envelope, SOAP12_NAMESPACE, "Body"))
        .or_else(|| element_child(envelope, "Body"))
}

fn check_fault(body: Node<'_, '_>) -> Result<(), SoapError> {
    let Some(fault) = element_child(body, "Fault") else {
        return Ok(());
    };

    // SOAP 1.1 carries faultcode/faultstring, SOAP 1.2 nests Code/Value and Reason/Text.
    let code = child_text(fault, "faultcode")
        .or_else(|| element_child(fault, "Code").and_then(|node| child_text(node, "Value")))
        .filter(|value| !value.is_empty())
        .unwrap_or(DEFAULT_FAULT_CODE);
    let message = child_text(fault, "faultstring")
        .or_else(|| element_child(fault, "Reason").and_then(|node| child_text(node, "Text")))
        .filter(|value| !value.is_empty())
        .unwrap_or(DEFAULT_FAULT_MESSAGE);

    Err(SoapError::Fault {
        code: code.to_owned(),
        message: message.to_owned(),
    })
}

/// Depth-first search for the first element named `name` below `scope`,
/// skipping schema subtrees.
pub fn find_dataset<'a, 'input>(scope: Node<'a, 'input>, name: &str) -> Option<Node<'a, 'input>> {
    for child in scope.children().filter(Node::is_element) {
        let local = child.tag_name().name();
        if local == SCHEMA_NODE {
            continue;
        }
        if local == name {
            return Some(child);
        }
        if let Some(found) = find_dataset(child, name) {
            return Some(found);
        }
    }
    None
}

pub fn require_dataset<'a, 'input>(
    result: Node<'a, 'input>,
    action: &str,
    name: &str,
) -> Result<Node<'a, 'input>, SoapError> {
    find_dataset(result, name).ok_or_else(|| SoapError::MissingDataset {
        action: action.to_owned(),
        node: name.to_owned(),
    })
}

/// All elements named `name` below `scope`, in document order.
pub fn rows<'a, 'input>(scope: Node<'a, 'input>, name: &str) -> Vec<Node<'a, 'input>> {
    scope
        .descendants()
        .filter(|node| node.is_element() && node.tag_name().name() == name && *node != scope)
        .collect()
}

/// Trimmed text of the first child element named `name`; an empty element
/// yields `Some("")`.
pub fn child_text<'a>(node: Node<'a, '_>, name: &str) -> Option<&'a str> {
    element_child(node, name).map(|child| child.text().unwrap_or_default().trim())
}

/// Trimmed text of the child, with empty values treated as absent.
pub fn optional_text<'a>(node: Node<'a, '_>, name: &str) -> Option<&'a str> {
    child_text(node, name).filter(|value| !value.is_empty())
}

pub fn text_of<'a>(node: Node<'a, '_>) -> &'a str {
    node.text().unwrap_or_default().trim()
}

fn element_child<'a, 'input>(node: Node<'a, 'input>, name: &str) -> Option<Node<'a, 'input>> {
    node.children()
        .find(|child| child.is_element() && child.tag_name().name() == name)
}

fn namespaced_child<'a, 'input>(
    node: Node<'a, 'input>,
    namespace: &str,
    name: &str,
) -> Option<Node<'a, 'input>> {
    node.children().find(|child| {
        child.is_element()
            && child.tag_name().name() == name
            && child.tag_name().namespace() == Some(namespace)
    })
}
