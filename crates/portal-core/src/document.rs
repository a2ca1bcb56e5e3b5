//! Rich-text post bodies.
//!
//! Posts store their body as an editor document: a tree of typed nodes
//! serialized as `{"type", "attrs", "content", "marks", "text"}` objects.

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Node {
    Doc {
        #[serde(default)]
        content: Vec<Node>,
    },
    Paragraph {
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        content: Vec<Node>,
    },
    Heading {
        attrs: HeadingAttrs,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        content: Vec<Node>,
    },
    Text {
        text: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        marks: Vec<Mark>,
    },
    BulletList {
        #[serde(default)]
        content: Vec<Node>,
    },
    OrderedList {
        #[serde(default)]
        attrs: OrderedListAttrs,
        #[serde(default)]
        content: Vec<Node>,
    },
    ListItem {
        #[serde(default)]
        content: Vec<Node>,
    },
    Blockquote {
        #[serde(default)]
        content: Vec<Node>,
    },
    CodeBlock {
        #[serde(default)]
        attrs: CodeBlockAttrs,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        content: Vec<Node>,
    },
    Image {
        attrs: ImageAttrs,
    },
    HorizontalRule,
    HardBreak,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeadingAttrs {
    pub level: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderedListAttrs {
    #[serde(default = "first_item")]
    pub start: u32,
}

impl Default for OrderedListAttrs {
    fn default() -> Self {
        Self { start: first_item() }
    }
}

fn first_item() -> u32 {
    1
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeBlockAttrs {
    #[serde(default)]
    pub language: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageAttrs {
    pub src: String,
    #[serde(default)]
    pub alt: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Mark {
    Bold,
    Italic,
    Strike,
    Code,
    Link { attrs: LinkAttrs },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkAttrs {
    pub href: String,
    #[serde(default)]
    pub target: Option<String>,
}

impl Node {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text {
            text: text.into(),
            marks: Vec::new(),
        }
    }

    pub fn paragraph(content: Vec<Node>) -> Self {
        Self::Paragraph { content }
    }

    pub fn image(src: impl Into<String>, alt: Option<String>) -> Self {
        Self::Image {
            attrs: ImageAttrs {
                src: src.into(),
                alt,
                title: None,
            },
        }
    }

    pub fn children(&self) -> &[Node] {
        match self {
            Self::Doc { content }
            | Self::Paragraph { content }
            | Self::Heading { content, .. }
            | Self::BulletList { content }
            | Self::OrderedList { content, .. }
            | Self::ListItem { content }
            | Self::Blockquote { content }
            | Self::CodeBlock { content, .. } => content,
            Self::Text { .. } | Self::Image { .. } | Self::HorizontalRule | Self::HardBreak => &[],
        }
    }

    fn write_text(&self, out: &mut String) {
        match self {
            Self::Text { text, .. } => out.push_str(text),
            Self::HardBreak => out.push('\n'),
            Self::Paragraph { content } | Self::Heading { content, .. } | Self::CodeBlock { content, .. } => {
                for child in content {
                    child.write_text(out);
                }
            }
            Self::Doc { content }
            | Self::BulletList { content }
            | Self::OrderedList { content, .. }
            | Self::ListItem { content }
            | Self::Blockquote { content } => {
                let mut first = true;
                for child in content {
                    let mut block = String::new();
                    child.write_text(&mut block);
                    if block.is_empty() {
                        continue;
                    }
                    if !first {
                        out.push('\n');
                    }
                    out.push_str(&block);
                    first = false;
                }
            }
            Self::Image { .. } | Self::HorizontalRule => {}
        }
    }
}

/// A post body: the top-level `doc` node.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Node", into = "Node")]
pub struct Document {
    pub content: Vec<Node>,
}

impl TryFrom<Node> for Document {
    type Error = String;

    fn try_from(node: Node) -> Result<Self, Self::Error> {
        match node {
            Node::Doc { content } => Ok(Self { content }),
            other => Err(format!(
                "expected a doc node at the top level, found {}",
                node_kind(&other)
            )),
        }
    }
}

impl From<Document> for Node {
    fn from(doc: Document) -> Self {
        Node::Doc {
            content: doc.content,
        }
    }
}

fn node_kind(node: &Node) -> &'static str {
    match node {
        Node::Doc { .. } => "doc",
        Node::Paragraph { .. } => "paragraph",
        Node::Heading { .. } => "heading",
        Node::Text { .. } => "text",
        Node::BulletList { .. } => "bulletList",
        Node::OrderedList { .. } => "orderedList",
        Node::ListItem { .. } => "listItem",
        Node::Blockquote { .. } => "blockquote",
        Node::CodeBlock { .. } => "codeBlock",
        Node::Image { .. } => "image",
        Node::HorizontalRule => "horizontalRule",
        Node::HardBreak => "hardBreak",
    }
}

impl Document {
    pub fn parse(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }

    pub fn to_value(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Build a document from plain text. Blank lines separate paragraphs and
    /// single newlines inside a paragraph become hard breaks.
    pub fn from_plain_text(text: &str) -> Self {
        let normalized = text.replace("\r\n", "\n");
        let mut content = Vec::new();
        let mut current: Vec<&str> = Vec::new();

        for line in normalized.split('\n') {
            if line.trim().is_empty() {
                if !current.is_empty() {
                    content.push(paragraph_from_lines(&current));
                    current.clear();
                }
            } else {
                current.push(line);
            }
        }
        if !current.is_empty() {
            content.push(paragraph_from_lines(&current));
        }

        Self { content }
    }

    /// Text content with blocks on separate lines and paragraphs separated
    /// by a blank line. Images and rules contribute nothing.
    pub fn plain_text(&self) -> String {
        let mut blocks = Vec::new();
        for node in &self.content {
            let mut block = String::new();
            node.write_text(&mut block);
            if !block.is_empty() {
                blocks.push(block);
            }
        }
        blocks.join("\n\n")
    }

    /// Append an image block, as done when inserting a generated image.
    pub fn push_image(&mut self, src: impl Into<String>, alt: Option<String>) {
        self.content.push(Node::image(src, alt));
    }

    /// Sources of every image in the document, in order.
    pub fn image_sources(&self) -> Vec<&str> {
        let mut sources = Vec::new();
        let mut stack: Vec<&Node> = self.content.iter().rev().collect();
        while let Some(node) = stack.pop() {
            if let Node::Image { attrs } = node {
                sources.push(attrs.src.as_str());
            }
            stack.extend(node.children().iter().rev());
        }
        sources
    }

    pub fn is_empty(&self) -> bool {
        self.plain_text().trim().is_empty() && self.image_sources().is_empty()
    }
}

fn paragraph_from_lines(lines: &[&str]) -> Node {
    let mut content = Vec::with_capacity(lines.len() * 2);
    for (i, line) in lines.iter().enumerate() {
        if i > 0 {
            content.push(Node::HardBreak);
        }
        content.push(Node::text(*line));
    }
    Node::paragraph(content)
}
