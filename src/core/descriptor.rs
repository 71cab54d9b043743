//! Project descriptor (`.csproj`) parsing.
//!
//! Descriptors are read into a small element tree and then queried by local
//! name, so schema prefixes and the MSBuild namespace never matter. Anything
//! the resolver does not understand is skipped.

use std::path::{Path, PathBuf};

use miette::{NamedSource, SourceSpan};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use thiserror::Error;

use crate::util::fs::native_path;

/// Namespace of pre-SDK MSBuild project files.
const LEGACY_NAMESPACE: &str = "http://schemas.microsoft.com/developer/msbuild/2003";

/// Label marking an import as a shared project.
const SHARED_LABEL: &str = "Shared";

/// Error while loading a project descriptor.
#[derive(Debug, Error, miette::Diagnostic)]
pub enum DescriptorError {
    #[error("failed to read project descriptor: {}", .path.display())]
    #[diagnostic(
        code(wharf::descriptor::read),
        help("check that the project path exists and is a UTF-8 text file")
    )]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed project descriptor {}: {message}", .path.display())]
    #[diagnostic(code(wharf::descriptor::malformed))]
    Malformed {
        path: PathBuf,
        message: String,
        #[source_code]
        src: NamedSource<String>,
        #[label("here")]
        span: SourceSpan,
    },

    #[error("{} is not a project descriptor (root element is `{root}`)", .path.display())]
    #[diagnostic(
        code(wharf::descriptor::not_a_project),
        help("pass a .csproj file whose root element is <Project>")
    )]
    NotAProject { path: PathBuf, root: String },
}

impl DescriptorError {
    fn malformed(path: &Path, text: &str, offset: usize, message: impl Into<String>) -> Self {
        let offset = offset.min(text.len());
        DescriptorError::Malformed {
            path: path.to_path_buf(),
            message: message.into(),
            src: NamedSource::new(path.display().to_string(), text.to_string()),
            span: (offset, 0).into(),
        }
    }
}

/// Project file layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DescriptorFormat {
    /// Pre-SDK project: only explicitly listed sources are compiled.
    Legacy,
    /// SDK-style project: every source under the project directory is compiled.
    Modern,
}

/// A binary reference declared with `<Reference>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssemblyReference {
    /// Simple assembly name (strong-name parts removed)
    pub name: String,
    /// Raw `<HintPath>`, relative to the descriptor's directory
    pub hint_path: Option<PathBuf>,
}

/// A package dependency declared with `<PackageReference>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageReference {
    /// Package identifier as written
    pub id: String,
    /// Exact package version as written
    pub version: String,
}

/// A parsed project descriptor.
#[derive(Debug, Clone)]
pub struct ProjectDescriptor {
    path: PathBuf,
    format: DescriptorFormat,
    compile_items: Vec<String>,
    shared_imports: Vec<PathBuf>,
    project_references: Vec<PathBuf>,
    assembly_references: Vec<AssemblyReference>,
    package_references: Vec<PackageReference>,
    target_frameworks: Vec<String>,
}

impl ProjectDescriptor {
    /// Load and parse a descriptor file.
    pub fn load(path: &Path) -> Result<Self, DescriptorError> {
        let text = std::fs::read_to_string(path).map_err(|source| DescriptorError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text, path)
    }

    /// Parse descriptor text. `path` locates relative items.
    pub fn parse(text: &str, path: &Path) -> Result<Self, DescriptorError> {
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);
        let root = parse_markup(text, path)?;

        if !root.is("Project") {
            return Err(DescriptorError::NotAProject {
                path: path.to_path_buf(),
                root: root.name,
            });
        }

        let dir = path.parent().unwrap_or(Path::new(".")).to_path_buf();
        let mut descriptor = ProjectDescriptor {
            path: path.to_path_buf(),
            format: detect_format(&root),
            compile_items: Vec::new(),
            shared_imports: Vec::new(),
            project_references: Vec::new(),
            assembly_references: Vec::new(),
            package_references: Vec::new(),
            target_frameworks: Vec::new(),
        };

        let mut single_framework = None;
        let mut multi_framework = None;

        for element in root.descendants() {
            match element.name.as_str() {
                n if n.eq_ignore_ascii_case("Compile") => {
                    if element.attr("Exclude").is_some() || element.attr("Remove").is_some() {
                        tracing::debug!(
                            "{}: compile exclusions are not supported, ignoring",
                            path.display()
                        );
                    }
                    if let Some(include) = element.attr("Include") {
                        descriptor.compile_items.extend(
                            include
                                .split(';')
                                .map(str::trim)
                                .filter(|p| !p.is_empty())
                                .map(String::from),
                        );
                    }
                }
                n if n.eq_ignore_ascii_case("Import") => {
                    let shared = element
                        .attr("Label")
                        .is_some_and(|l| l.eq_ignore_ascii_case(SHARED_LABEL));
                    if let (true, Some(project)) = (shared, element.attr("Project")) {
                        let items = dir.join(native_path(project));
                        let folder = items.parent().unwrap_or(&dir).to_path_buf();
                        descriptor.shared_imports.push(folder);
                    }
                }
                n if n.eq_ignore_ascii_case("ProjectReference") => {
                    if let Some(include) = element.attr("Include") {
                        descriptor.project_references.push(dir.join(native_path(include)));
                    }
                }
                n if n.eq_ignore_ascii_case("Reference") => {
                    let Some(include) = element.attr("Include") else {
                        continue;
                    };
                    let name = include.split(',').next().unwrap_or_default().trim();
                    if name.is_empty() {
                        continue;
                    }
                    let hint_path = element
                        .child("HintPath")
                        .map(|h| h.text.trim())
                        .filter(|h| !h.is_empty())
                        .map(native_path);
                    descriptor.assembly_references.push(AssemblyReference {
                        name: name.to_string(),
                        hint_path,
                    });
                }
                n if n.eq_ignore_ascii_case("PackageReference") => {
                    let Some(id) = element.attr("Include").map(str::trim) else {
                        continue;
                    };
                    let version = element
                        .attr("Version")
                        .map(str::to_string)
                        .or_else(|| element.child("Version").map(|v| v.text.clone()));
                    match version.as_deref().map(str::trim) {
                        Some(version) if !version.is_empty() => {
                            descriptor.package_references.push(PackageReference {
                                id: id.to_string(),
                                version: version.to_string(),
                            });
                        }
                        _ => tracing::debug!(
                            "{}: package `{}` has no version, ignoring",
                            path.display(),
                            id
                        ),
                    }
                }
                n if n.eq_ignore_ascii_case("TargetFramework") => {
                    let text = element.text.trim();
                    if single_framework.is_none() && !text.is_empty() {
                        single_framework = Some(text.to_string());
                    }
                }
                n if n.eq_ignore_ascii_case("TargetFrameworks") => {
                    let text = element.text.trim();
                    if multi_framework.is_none() && !text.is_empty() {
                        multi_framework = Some(text.to_string());
                    }
                }
                _ => {}
            }
        }

        descriptor.target_frameworks = match (single_framework, multi_framework) {
            (Some(single), _) => vec![single],
            (None, Some(multi)) => multi
                .split(';')
                .map(str::trim)
                .filter(|f| !f.is_empty())
                .map(String::from)
                .collect(),
            (None, None) => Vec::new(),
        };

        Ok(descriptor)
    }

    /// Path of the descriptor file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Directory containing the descriptor; relative items resolve against it.
    pub fn dir(&self) -> &Path {
        self.path.parent().unwrap_or(Path::new("."))
    }

    /// Project layout.
    pub fn format(&self) -> DescriptorFormat {
        self.format
    }

    /// Whether the project compiles its directory by convention.
    pub fn is_modern(&self) -> bool {
        self.format == DescriptorFormat::Modern
    }

    /// Raw `<Compile Include>` patterns in document order.
    pub fn compile_items(&self) -> &[String] {
        &self.compile_items
    }

    /// Folders of shared projects imported with `Label="Shared"`.
    pub fn shared_imports(&self) -> &[PathBuf] {
        &self.shared_imports
    }

    /// Referenced descriptor paths, joined onto [`Self::dir`].
    pub fn project_references(&self) -> &[PathBuf] {
        &self.project_references
    }

    /// Declared `<Reference>` items.
    pub fn assembly_references(&self) -> &[AssemblyReference] {
        &self.assembly_references
    }

    /// Declared `<PackageReference>` items.
    pub fn package_references(&self) -> &[PackageReference] {
        &self.package_references
    }

    /// Declared target framework monikers.
    pub fn target_frameworks(&self) -> &[String] {
        &self.target_frameworks
    }

    /// The framework used for package lookup: the first declared one.
    pub fn primary_target_framework(&self) -> Option<&str> {
        self.target_frameworks.first().map(String::as_str)
    }
}

fn detect_format(root: &Element) -> DescriptorFormat {
    let has_sdk = root.attr("Sdk").is_some_and(|s| !s.trim().is_empty())
        || root.children.iter().any(|c| {
            c.is("Sdk") || (c.is("Import") && c.attr("Sdk").is_some())
        });
    if has_sdk {
        return DescriptorFormat::Modern;
    }

    let legacy = root.attr("ToolsVersion").is_some()
        || root
            .attr("xmlns")
            .is_some_and(|ns| ns.trim() == LEGACY_NAMESPACE);
    if legacy {
        DescriptorFormat::Legacy
    } else {
        DescriptorFormat::Modern
    }
}

/// A markup element reduced to what the resolver queries.
#[derive(Debug, Default)]
struct Element {
    name: String,
    attributes: Vec<(String, String)>,
    children: Vec<Element>,
    text: String,
}

impl Element {
    fn is(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }

    fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.is(name))
    }

    /// All descendants in document order, excluding `self`.
    fn descendants(&self) -> Vec<&Element> {
        let mut out = Vec::new();
        let mut stack: Vec<&Element> = self.children.iter().rev().collect();
        while let Some(element) = stack.pop() {
            out.push(element);
            stack.extend(element.children.iter().rev());
        }
        out
    }
}

fn local_name(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw).into_owned()
}

fn open_element(start: &BytesStart<'_>) -> Result<Element, String> {
    let mut element = Element {
        name: local_name(start.local_name().as_ref()),
        ..Default::default()
    };
    for attr in start.attributes() {
        let attr = attr.map_err(|e| e.to_string())?;
        let value = attr.unescape_value().map_err(|e| e.to_string())?;
        element
            .attributes
            .push((local_name(attr.key.local_name().as_ref()), value.into_owned()));
    }
    Ok(element)
}

fn parse_markup(text: &str, path: &Path) -> Result<Element, DescriptorError> {
    let mut reader = Reader::from_str(text);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        let position = reader.buffer_position() as usize;
        let event = reader.read_event().map_err(|e| {
            DescriptorError::malformed(path, text, reader.error_position() as usize, e.to_string())
        })?;

        let closed = match event {
            Event::Start(start) => {
                let element = open_element(&start)
                    .map_err(|m| DescriptorError::malformed(path, text, position, m))?;
                stack.push(element);
                None
            }
            Event::Empty(start) => Some(
                open_element(&start)
                    .map_err(|m| DescriptorError::malformed(path, text, position, m))?,
            ),
            Event::End(_) => stack.pop(),
            Event::Text(t) => {
                let value = t
                    .unescape()
                    .map_err(|e| DescriptorError::malformed(path, text, position, e.to_string()))?;
                if let Some(top) = stack.last_mut() {
                    top.text.push_str(&value);
                }
                None
            }
            Event::CData(c) => {
                if let Some(top) = stack.last_mut() {
                    top.text.push_str(&String::from_utf8_lossy(&c));
                }
                None
            }
            Event::Eof => break,
            _ => None,
        };

        if let Some(element) = closed {
            match stack.last_mut() {
                Some(parent) => parent.children.push(element),
                None if root.is_none() => root = Some(element),
                None => {
                    return Err(DescriptorError::malformed(
                        path,
                        text,
                        position,
                        "more than one root element",
                    ))
                }
            }
        }
    }

    if let Some(open) = stack.last() {
        return Err(DescriptorError::malformed(
            path,
            text,
            text.len(),
            format!("unclosed element `{}`", open.name),
        ));
    }

    root.ok_or_else(|| DescriptorError::malformed(path, text, 0, "document has no root element"))
}
