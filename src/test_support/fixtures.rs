//! Canned project files for tests.

/// An SDK-style project with `body` inside the `<Project>` element.
pub fn sdk_project_xml(body: &str) -> String {
    format!("<Project Sdk=\"Microsoft.NET.Sdk\">\n  {body}\n</Project>\n")
}

/// A legacy project listing `includes` as `<Compile>` items.
pub fn legacy_project_xml(includes: &[&str]) -> String {
    let items: String = includes
        .iter()
        .map(|i| format!("    <Compile Include=\"{i}\" />\n"))
        .collect();
    format!(
        "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n\
<Project ToolsVersion=\"15.0\" xmlns=\"http://schemas.microsoft.com/developer/msbuild/2003\">\n\
  <ItemGroup>\n{items}  </ItemGroup>\n</Project>\n"
    )
}

/// A source declaring one serializable type.
pub fn message_type_cs(namespace: &str, name: &str) -> String {
    format!(
        r#"using MessagePack;

namespace {namespace}
{{
    /// <summary>A {name}.</summary>
    [MessagePackObject]
    public class {name}
    {{
        [Key(0)]
        public int Id {{ get; set; }}
    }}
}}
"#
    )
}
