//! The datasheet document model.
//!
//! A datasheet is an XML document shaped like this:
//!
//! ```xml
//! <Datasheet parent="Orc.unit">
//!     <Data name="health" value="50"/>
//!     <Data name="tags">
//!         <Child value="green"/>
//!         <Child value="brute"/>
//!     </Data>
//!     <Data name="weapon" type="axe">
//!         <Data name="damage" value="12"/>
//!     </Data>
//! </Datasheet>
//! ```
//!
//! Documents are parsed with the `quick-xml` event reader into a small
//! [`DataNode`] tree that keeps attribute order and distinguishes an empty
//! attribute from an absent one (`type=""` forces a null instance).

use crate::error::DatasheetError;
use quick_xml::Reader;
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};
use std::path::Path;

pub const ROOT_TAG: &str = "Datasheet";
pub const DATA_TAG: &str = "Data";
pub const CHILD_TAG: &str = "Child";

pub const ATTR_NAME: &str = "name";
pub const ATTR_VALUE: &str = "value";
pub const ATTR_TYPE: &str = "type";
pub const ATTR_PARENT: &str = "parent";

// ---------------------------------------------------------------------------
// DataNode
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DataNode {
    tag: String,
    attributes: Vec<(String, String)>,
    children: Vec<DataNode>,
}

impl DataNode {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// A `<Data name="...">` member node.
    pub fn data(name: &str) -> Self {
        Self::new(DATA_TAG).with_attribute(ATTR_NAME, name)
    }

    /// A `<Child>` array element.
    pub fn child() -> Self {
        Self::new(CHILD_TAG)
    }

    pub fn with_attribute(mut self, name: &str, value: &str) -> Self {
        self.set_attribute(name, value);
        self
    }

    pub fn with_value(self, value: &str) -> Self {
        self.with_attribute(ATTR_VALUE, value)
    }

    pub fn with_type(self, type_name: &str) -> Self {
        self.with_attribute(ATTR_TYPE, type_name)
    }

    pub fn with_child(mut self, child: DataNode) -> Self {
        self.children.push(child);
        self
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn attributes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }

    pub fn set_attribute(&mut self, name: &str, value: &str) {
        match self.attributes.iter_mut().find(|(key, _)| key == name) {
            Some((_, existing)) => *existing = value.to_string(),
            None => self
                .attributes
                .push((name.to_string(), value.to_string())),
        }
    }

    pub fn remove_attribute(&mut self, name: &str) -> Option<String> {
        let index = self.attributes.iter().position(|(key, _)| key == name)?;
        Some(self.attributes.remove(index).1)
    }

    pub fn children(&self) -> &[DataNode] {
        &self.children
    }

    pub fn push_child(&mut self, child: DataNode) {
        self.children.push(child);
    }

    pub fn children_tagged<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a DataNode> {
        self.children.iter().filter(move |child| child.tag == tag)
    }

    /// The first `<Data>` child whose `name` attribute is `name`.
    pub fn find_data(&self, name: &str) -> Option<&DataNode> {
        self.children
            .iter()
            .find(|child| child.tag == DATA_TAG && child.attribute(ATTR_NAME) == Some(name))
    }
}

// ---------------------------------------------------------------------------
// DatasheetDocument
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasheetDocument {
    root: DataNode,
}

impl Default for DatasheetDocument {
    fn default() -> Self {
        Self {
            root: DataNode::new(ROOT_TAG),
        }
    }
}

impl DatasheetDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap an already built `<Datasheet>` node.
    pub fn from_root(root: DataNode) -> Result<Self, DatasheetError> {
        if root.tag != ROOT_TAG {
            return Err(DatasheetError::UnexpectedRoot {
                file: String::new(),
                found: root.tag,
            });
        }
        Ok(Self { root })
    }

    pub fn root(&self) -> &DataNode {
        &self.root
    }

    pub fn root_mut(&mut self) -> &mut DataNode {
        &mut self.root
    }

    /// The id of the parent datasheet, if one is declared.
    pub fn parent(&self) -> Option<&str> {
        self.root
            .attribute(ATTR_PARENT)
            .filter(|parent| !parent.is_empty())
    }

    pub fn set_parent(&mut self, parent: Option<&str>) {
        match parent {
            Some(parent) => self.root.set_attribute(ATTR_PARENT, parent),
            None => {
                self.root.remove_attribute(ATTR_PARENT);
            }
        }
    }

    pub fn load_file(path: &Path) -> Result<Self, DatasheetError> {
        let content = std::fs::read_to_string(path)?;
        Self::parse_str(&content, &path.display().to_string())
    }

    /// Parse `xml`. `file` only labels errors.
    pub fn parse_str(xml: &str, file: &str) -> Result<Self, DatasheetError> {
        let parse_error = |detail: String| DatasheetError::Parse {
            file: file.to_string(),
            detail,
        };

        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(true);

        let mut stack: Vec<DataNode> = Vec::new();
        let mut root: Option<DataNode> = None;
        loop {
            let event = reader.read_event().map_err(|e| {
                parse_error(format!("at position {}: {e}", reader.buffer_position()))
            })?;
            match event {
                Event::Start(start) => stack.push(node_from_start(&start).map_err(parse_error)?),
                Event::Empty(start) => {
                    let node = node_from_start(&start).map_err(parse_error)?;
                    attach(&mut stack, &mut root, node).map_err(parse_error)?;
                }
                Event::End(_) => {
                    let node = stack
                        .pop()
                        .ok_or_else(|| parse_error("unexpected closing tag".into()))?;
                    attach(&mut stack, &mut root, node).map_err(parse_error)?;
                }
                Event::Eof => break,
                _ => {}
            }
        }
        if !stack.is_empty() {
            return Err(parse_error("unclosed element at end of document".into()));
        }

        let root = root.ok_or_else(|| parse_error("document has no root element".into()))?;
        if root.tag != ROOT_TAG {
            return Err(DatasheetError::UnexpectedRoot {
                file: file.to_string(),
                found: root.tag,
            });
        }
        Ok(Self { root })
    }

    pub fn to_xml_string(&self) -> Result<String, DatasheetError> {
        let write_error = |detail: String| DatasheetError::Write {
            file: String::new(),
            detail,
        };
        let mut writer = Writer::new_with_indent(Vec::new(), b' ', 4);
        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))
            .map_err(|e| write_error(e.to_string()))?;
        write_node(&mut writer, &self.root).map_err(write_error)?;
        String::from_utf8(writer.into_inner()).map_err(|e| write_error(e.to_string()))
    }

    pub fn save_file(&self, path: &Path) -> Result<(), DatasheetError> {
        let xml = self.to_xml_string().map_err(|e| match e {
            DatasheetError::Write { detail, .. } => DatasheetError::Write {
                file: path.display().to_string(),
                detail,
            },
            other => other,
        })?;
        std::fs::write(path, xml)?;
        Ok(())
    }
}

fn node_from_start(start: &BytesStart<'_>) -> Result<DataNode, String> {
    let mut node = DataNode::new(String::from_utf8_lossy(start.name().as_ref()).into_owned());
    for attribute in start.attributes() {
        let attribute = attribute.map_err(|e| e.to_string())?;
        let key = String::from_utf8_lossy(attribute.key.as_ref()).into_owned();
        let value = attribute.unescape_value().map_err(|e| e.to_string())?;
        node.attributes.push((key, value.into_owned()));
    }
    Ok(node)
}

fn attach(
    stack: &mut [DataNode],
    root: &mut Option<DataNode>,
    node: DataNode,
) -> Result<(), String> {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(node);
        return Ok(());
    }
    if root.is_some() {
        return Err(format!("second root element <{}>", node.tag));
    }
    *root = Some(node);
    Ok(())
}

fn write_node(writer: &mut Writer<Vec<u8>>, node: &DataNode) -> Result<(), String> {
    let mut start = BytesStart::new(node.tag.as_str());
    for (key, value) in &node.attributes {
        start.push_attribute((key.as_str(), value.as_str()));
    }
    if node.children.is_empty() {
        return writer
            .write_event(Event::Empty(start))
            .map_err(|e| e.to_string());
    }
    writer
        .write_event(Event::Start(start))
        .map_err(|e| e.to_string())?;
    for child in &node.children {
        write_node(writer, child)?;
    }
    writer
        .write_event(Event::End(BytesEnd::new(node.tag.as_str())))
        .map_err(|e| e.to_string())
}
