//! XML checklist (`.ckl`) support
//!
//! Layout, abbreviated:
//!
//! ```text
//! <CHECKLIST>
//!   <ASSET>...</ASSET>
//!   <STIGS>
//!     <iSTIG>
//!       <STIG_INFO>...</STIG_INFO>
//!       <VULN>
//!         <STIG_DATA>
//!           <VULN_ATTRIBUTE>Vuln_Num</VULN_ATTRIBUTE>
//!           <ATTRIBUTE_DATA>V-230221</ATTRIBUTE_DATA>
//!         </STIG_DATA>
//!         ...
//!         <STATUS>NotAFinding</STATUS>
//!         <FINDING_DETAILS>...</FINDING_DETAILS>
//!         <COMMENTS>...</COMMENTS>
//!       </VULN>
//!     </iSTIG>
//!   </STIGS>
//! </CHECKLIST>
//! ```
//!
//! Everything outside the fields we rewrite is carried through untouched.

use std::path::{Path, PathBuf};

use xmltree::{Element, EmitterConfig, XMLNode};

use super::document::{ChecklistDocument, ChecklistFormat};
use super::error::{ChecklistError, ChecklistResult};
use super::record::{CommentField, RuleRecord};

/// A parsed `.ckl` checklist
#[derive(Debug, Clone)]
pub struct CklDocument {
    path: PathBuf,
    root: Element,
}

impl CklDocument {
    /// Load from a file
    pub fn from_file(path: impl AsRef<Path>) -> ChecklistResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read(path).map_err(|e| ChecklistError::io(path, e))?;
        Self::parse(&content, path)
    }

    /// Parse from XML bytes; `path` is only used in error messages
    pub fn parse(content: &[u8], path: impl AsRef<Path>) -> ChecklistResult<Self> {
        let path = path.as_ref();
        let root = Element::parse(content).map_err(|e| ChecklistError::Xml {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        if root.name != "CHECKLIST" {
            return Err(ChecklistError::malformed(
                path,
                format!("expected <CHECKLIST> root, found <{}>", root.name),
            ));
        }

        Ok(Self {
            path: path.to_path_buf(),
            root,
        })
    }

    /// Path the checklist was loaded from
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn vulns(&self) -> impl Iterator<Item = &Element> {
        self.root
            .get_child("STIGS")
            .into_iter()
            .flat_map(|stigs| child_elements(stigs, "iSTIG"))
            .flat_map(|istig| child_elements(istig, "VULN"))
    }

    fn vuln_mut(&mut self, index: usize) -> Option<&mut Element> {
        self.root
            .get_mut_child("STIGS")?
            .children
            .iter_mut()
            .filter_map(|node| element_named_mut(node, "iSTIG"))
            .flat_map(|istig| {
                istig
                    .children
                    .iter_mut()
                    .filter_map(|node| element_named_mut(node, "VULN"))
            })
            .nth(index)
    }
}

fn child_elements<'a>(parent: &'a Element, name: &'a str) -> impl Iterator<Item = &'a Element> {
    parent.children.iter().filter_map(move |node| match node {
        XMLNode::Element(e) if e.name == name => Some(e),
        _ => None,
    })
}

fn element_named_mut<'a>(node: &'a mut XMLNode, name: &str) -> Option<&'a mut Element> {
    match node {
        XMLNode::Element(e) if e.name == name => Some(e),
        _ => None,
    }
}

fn child_text(parent: &Element, name: &str) -> Option<String> {
    parent
        .get_child(name)
        .and_then(|e| e.get_text())
        .map(|text| text.into_owned())
}

/// All `ATTRIBUTE_DATA` values for a `VULN_ATTRIBUTE` key
fn stig_data<'a>(vuln: &'a Element, key: &'a str) -> impl Iterator<Item = String> + 'a {
    child_elements(vuln, "STIG_DATA")
        .filter(move |data| child_text(data, "VULN_ATTRIBUTE").as_deref() == Some(key))
        .filter_map(|data| child_text(data, "ATTRIBUTE_DATA"))
}

fn first_stig_data(vuln: &Element, key: &str) -> String {
    stig_data(vuln, key).next().unwrap_or_default()
}

fn set_text(element: &mut Element, text: &str) {
    element
        .children
        .retain(|node| !matches!(node, XMLNode::Text(_) | XMLNode::CData(_)));
    if !text.is_empty() {
        element.children.push(XMLNode::Text(text.to_string()));
    }
}

fn vuln_record(vuln: &Element) -> RuleRecord {
    RuleRecord {
        vuln_id: first_stig_data(vuln, "Vuln_Num"),
        rule_id: first_stig_data(vuln, "Rule_ID"),
        severity: first_stig_data(vuln, "Severity"),
        group_title: first_stig_data(vuln, "Group_Title"),
        rule_title: first_stig_data(vuln, "Rule_Title"),
        discussion: first_stig_data(vuln, "Vuln_Discuss"),
        check_content: first_stig_data(vuln, "Check_Content"),
        fix_text: first_stig_data(vuln, "Fix_Text"),
        cci: stig_data(vuln, "CCI_REF").collect::<Vec<_>>().join(", "),
        status: child_text(vuln, "STATUS").unwrap_or_default(),
        comments: child_text(vuln, CommentField::Comments.ckl_element()),
        finding_details: child_text(vuln, CommentField::FindingDetails.ckl_element()),
    }
}

impl ChecklistDocument for CklDocument {
    fn format(&self) -> ChecklistFormat {
        ChecklistFormat::Ckl
    }

    fn len(&self) -> usize {
        self.vulns().count()
    }

    fn record(&self, index: usize) -> Option<RuleRecord> {
        self.vulns().nth(index).map(vuln_record)
    }

    fn records(&self) -> Vec<RuleRecord> {
        self.vulns().map(vuln_record).collect()
    }

    fn set_field(&mut self, index: usize, field: CommentField, text: &str) -> ChecklistResult<()> {
        let vuln = self
            .vuln_mut(index)
            .ok_or(ChecklistError::RecordOutOfRange { index })?;
        let name = field.ckl_element();

        match vuln.get_mut_child(name) {
            Some(element) => set_text(element, text),
            None => {
                let mut element = Element::new(name);
                set_text(&mut element, text);
                vuln.children.push(XMLNode::Element(element));
            }
        }
        Ok(())
    }

    fn to_bytes(&self) -> ChecklistResult<Vec<u8>> {
        let config = EmitterConfig::new()
            .perform_indent(true)
            .indent_string("\t")
            .write_document_declaration(true);

        let mut buf = Vec::new();
        self.root
            .write_with_config(&mut buf, config)
            .map_err(|e| ChecklistError::Xml {
                path: self.path.clone(),
                message: e.to_string(),
            })?;
        Ok(buf)
    }
}
