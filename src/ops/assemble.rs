//! Project graph assembly.
//!
//! Turns root descriptors, or a bare source directory, into one merged
//! [`Resolution`].

use std::path::{Path, PathBuf};

use crate::resolver::{ReferenceResolver, Resolution, ResolutionContext, ResolveError};
use crate::sources::{discover_sources, PackageCacheLocator};
use crate::util::{CancellationToken, GlobalContext};

/// Drives resolution over one or more roots.
#[derive(Debug, Clone)]
pub struct ProjectGraphAssembler {
    packages: PackageCacheLocator,
    framework_dir: Option<PathBuf>,
}

impl ProjectGraphAssembler {
    /// Create an assembler.
    pub fn new(packages: PackageCacheLocator, framework_dir: Option<PathBuf>) -> Self {
        ProjectGraphAssembler {
            packages,
            framework_dir,
        }
    }

    /// Create an assembler using the package cache and platform directory of
    /// `gctx`.
    pub fn from_context(gctx: &GlobalContext) -> Self {
        Self::new(
            PackageCacheLocator::new(gctx.package_root()),
            gctx.framework_dir().map(Path::to_path_buf),
        )
    }

    /// Resolve every root descriptor into one shared pair of sets.
    ///
    /// A project reachable from several roots contributes once.
    pub fn assemble_projects(
        &self,
        roots: &[PathBuf],
        token: &CancellationToken,
    ) -> Result<Resolution, ResolveError> {
        let resolver =
            ReferenceResolver::new(&self.packages, self.framework_dir.as_deref(), token);
        let mut cx = ResolutionContext::new();

        for root in roots {
            tracing::info!("Resolving {}", root.display());
            let canonical = resolver.resolve_project(root, &mut cx)?;
            cx.graph_mut().add_root(&canonical);
        }

        let resolution = cx.finish();
        tracing::info!(
            "Resolved {} project(s): {} source(s), {} reference(s)",
            resolution.graph.len(),
            resolution.sources.len(),
            resolution.references.len()
        );
        Ok(resolution)
    }

    /// Collect the sources below `dir` without any descriptor. The result
    /// has no references.
    pub fn assemble_directory(
        &self,
        dir: &Path,
        token: &CancellationToken,
    ) -> Result<Resolution, ResolveError> {
        if token.is_cancelled() {
            return Err(ResolveError::Cancelled);
        }

        tracing::info!("Collecting sources in {}", dir.display());
        let mut cx = ResolutionContext::new();
        cx.sources_mut().extend(discover_sources(dir)?);

        let resolution = cx.finish();
        tracing::info!("Found {} source(s)", resolution.sources.len());
        Ok(resolution)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::ResolutionError;
    use crate::test_support::{legacy_project_xml, TestTree};

    fn assembler(tree: &TestTree) -> ProjectGraphAssembler {
        ProjectGraphAssembler::new(
            PackageCacheLocator::new(tree.path("packages")),
            Some(tree.path("framework")),
        )
    }

    #[test]
    fn test_roots_share_accumulators() {
        let tree = TestTree::new();
        tree.file("libs/Vendor.dll", "");
        tree.file("packages/messagepack/2.5.0/lib/net6.0/MessagePack.dll", "");
        tree.file("Shared/Model.cs", "");
        tree.sdk_project(
            "Shared/Shared.csproj",
            r#"<PropertyGroup><TargetFramework>net6.0</TargetFramework></PropertyGroup>
  <ItemGroup>
    <Reference Include="Vendor"><HintPath>..\libs\Vendor.dll</HintPath></Reference>
    <PackageReference Include="MessagePack" Version="2.5.0" />
  </ItemGroup>"#,
        );
        tree.file("Server/Server.cs", "");
        tree.sdk_project(
            "Server/Server.csproj",
            r#"<ItemGroup>
    <Reference Include="Vendor"><HintPath>..\libs\Vendor.dll</HintPath></Reference>
    <ProjectReference Include="..\Shared\Shared.csproj" />
  </ItemGroup>"#,
        );
        tree.file("Client/Client.cs", "");
        tree.sdk_project(
            "Client/Client.csproj",
            r#"<ItemGroup><ProjectReference Include="..\Shared\Shared.csproj" /></ItemGroup>"#,
        );

        let roots = [
            tree.path("Server/Server.csproj"),
            tree.path("Client/Client.csproj"),
        ];
        let resolution = assembler(&tree)
            .assemble_projects(&roots, &CancellationToken::new())
            .unwrap();

        assert_eq!(
            tree.relative(&resolution.references.into_vec()),
            [
                "libs/Vendor.dll",
                "packages/messagepack/2.5.0/lib/net6.0/MessagePack.dll"
            ]
        );
        assert_eq!(
            tree.relative(&resolution.sources.into_vec()),
            ["Client/Client.cs", "Server/Server.cs", "Shared/Model.cs"]
        );
        assert_eq!(resolution.graph.len(), 3);
        assert_eq!(
            tree.relative(resolution.graph.roots()),
            ["Server/Server.csproj", "Client/Client.csproj"]
        );
    }

    #[test]
    fn test_same_root_twice() {
        let tree = TestTree::new();
        tree.file("App/A.cs", "");
        let project = tree.sdk_project("App/App.csproj", "");

        let roots = [project.clone(), tree.path("App/../App/App.csproj")];
        let resolution = assembler(&tree)
            .assemble_projects(&roots, &CancellationToken::new())
            .unwrap();

        assert_eq!(resolution.sources.len(), 1);
        assert_eq!(resolution.graph.roots().len(), 1);
    }

    #[test]
    fn test_legacy_root_with_wildcards() {
        let tree = TestTree::new();
        tree.file("Legacy/Top.cs", "");
        tree.file("Legacy/A/Mid.cs", "");
        tree.file("Legacy/A/B/Deep.cs", "");
        tree.file("Legacy/A/bin/Skip.cs", "");
        tree.file("Legacy/Stray.txt", "");
        tree.file("Legacy/Legacy.csproj", &legacy_project_xml(&[r"**\*.cs"]));

        let resolution = assembler(&tree)
            .assemble_projects(&[tree.path("Legacy/Legacy.csproj")], &CancellationToken::new())
            .unwrap();

        assert_eq!(
            tree.relative(&resolution.sources.into_vec()),
            ["Legacy/A/B/Deep.cs", "Legacy/A/Mid.cs", "Legacy/Top.cs"]
        );
    }

    #[test]
    fn test_missing_pattern_root_is_fatal() {
        let tree = TestTree::new();
        tree.file("Legacy/Legacy.csproj", &legacy_project_xml(&[r"..\Gone\*.cs"]));

        let err = assembler(&tree)
            .assemble_projects(&[tree.path("Legacy/Legacy.csproj")], &CancellationToken::new())
            .unwrap_err();
        assert!(matches!(
            err,
            ResolveError::Sources(ResolutionError::MissingDirectory { .. })
        ));
    }

    #[test]
    fn test_directory_mode() {
        let tree = TestTree::new();
        tree.file("P/A.cs", "");
        tree.file("P/sub/B.cs", "");
        tree.file("P/bin/C.cs", "");
        tree.file("P/obj/nested/D.cs", "");
        tree.file("P/P.csproj", "<Project><ItemGroup><Reference Include=\"X\" /></ItemGroup></Project>");

        let resolution = assembler(&tree)
            .assemble_directory(&tree.path("P"), &CancellationToken::new())
            .unwrap();

        assert_eq!(
            tree.relative(&resolution.sources.into_vec()),
            ["P/A.cs", "P/sub/B.cs"]
        );
        assert!(resolution.references.is_empty());
        assert!(resolution.graph.is_empty());
    }

    #[test]
    fn test_directory_mode_missing_dir() {
        let tree = TestTree::new();
        let err = assembler(&tree)
            .assemble_directory(&tree.path("nope"), &CancellationToken::new())
            .unwrap_err();
        assert!(matches!(err, ResolveError::Sources(_)));
    }

    #[test]
    fn test_cancellation() {
        let tree = TestTree::new();
        tree.file("P/A.cs", "");
        tree.sdk_project("P/P.csproj", "");

        let token = CancellationToken::new();
        token.cancel();

        let assembler = assembler(&tree);
        assert!(assembler
            .assemble_projects(&[tree.path("P/P.csproj")], &token)
            .unwrap_err()
            .is_cancelled());
        assert!(assembler
            .assemble_directory(&tree.path("P"), &token)
            .unwrap_err()
            .is_cancelled());
    }
}
