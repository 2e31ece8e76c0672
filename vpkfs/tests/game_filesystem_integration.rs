//! Integration tests for the game filesystem over real disk.
//!
//! These tests lay out a Steam library, a mod with loose folders, multi-chunk
//! and single-file archives, and a mounted second game inside a temporary
//! directory, then query everything through `DiskSource`.
//!
//! Run with: `cargo test --test game_filesystem_integration`

mod common;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use bytes::Bytes;
use tempfile::TempDir;

use common::{slash, write, Placement, VpkBuilder};
use vpkfs::archive::{parse_index, ArchiveReader, RECORD_LEN};
use vpkfs::game::{GameFilesystem, ProviderKind, MOUNT_QUALIFIER};
use vpkfs::steam::ResolverRegistry;
use vpkfs::storage::{DiskSource, FileKind, StorageSource};
use vpkfs::SteamConfig;

// ============================================================================
// Fixture
// ============================================================================

const GAMEINFO: &str = r#"
"GameInfo"
{
    game        "Integration Mod"
    FileSystem
    {
        SteamAppId      620
        SearchPaths
        {
            Game+Mod    |gameinfo_path|.
            Game        |gameinfo_path|pak01.vpk
            Game        |gameinfo_path|custom/*
            Platform    platform
        }
    }
    mount
    {
        440
        {
            tf
            {
                vpk     "tf2_misc"
            }
        }
        730
        {
            csgo { dir "missing" }
        }
    }
}
"#;

struct Fixture {
    _temp: TempDir,
    steam: PathBuf,
    mod_root: PathBuf,
}

impl Fixture {
    fn new() -> Self {
        let temp = TempDir::new().unwrap();
        let steam = temp.path().join("steam");
        let common_dir = steam.join("steamapps").join("common");
        let mod_root = common_dir.join("Portal 2").join("portal2");

        write(
            &steam.join("steamapps").join("libraryfolders.vdf"),
            format!(
                "\"libraryfolders\"\n{{\n\"0\"\n{{\n\"path\" \"{}\"\n\"apps\"\n{{\n\"620\" \"1\"\n\"440\" \"1\"\n\"730\" \"1\"\n}}\n}}\n}}\n",
                slash(&steam)
            ),
        );
        write(
            &steam.join("steamapps").join("appmanifest_620.acf"),
            "\"AppState\"\n{\n\"installdir\" \"Portal 2\"\n}\n",
        );
        write(
            &steam.join("steamapps").join("appmanifest_440.acf"),
            "\"AppState\"\n{\n\"installdir\" \"Team Fortress 2\"\n}\n",
        );
        // 730 has no manifest: the mount is skipped

        write(&mod_root.join("gameinfo.txt"), GAMEINFO);
        write(&mod_root.join("scripts").join("loose.txt"), "loose");
        write(&mod_root.join("shared.txt"), "from folder");

        VpkBuilder::new(2)
            .file("/shared.txt", b"", b"from archive", Placement::Chunk(0))
            .file("/scripts/chunked.txt", b"head:", b"chunk body", Placement::Chunk(1))
            .file("/scripts/inline.txt", b"", b"inline body", Placement::Inline)
            .file("/scripts/preload.txt", b"all preload", b"", Placement::Chunk(0))
            .file("/bin/tool", b"", b"no extension", Placement::Chunk(0))
            .write_multi(&mod_root, "pak01");

        write(&mod_root.join("custom").join("a").join("custom.txt"), "custom folder");
        VpkBuilder::new(1)
            .file("/models/single.mdl", b"", b"single file", Placement::Inline)
            .write_single(&mod_root.join("custom").join("extra.vpk"));

        write(&common_dir.join("Portal 2").join("platform").join("platform.txt"), "platform");

        VpkBuilder::new(2)
            .file("/maps/mounted.bsp", b"", b"mounted map", Placement::Chunk(0))
            .write_multi(&common_dir.join("Team Fortress 2").join("tf"), "tf2_misc");

        Self {
            _temp: temp,
            steam,
            mod_root,
        }
    }

    fn filesystem(&self, registry: Arc<ResolverRegistry>) -> GameFilesystem {
        GameFilesystem::new(
            Arc::new(DiskSource::new()),
            slash(&self.mod_root),
            registry,
            SteamConfig::new(slash(&self.steam)),
        )
    }

    fn path(&self, rel: &str) -> PathBuf {
        self.mod_root.join(rel)
    }
}

// ============================================================================
// Integration Tests
// ============================================================================

#[tokio::test]
async fn test_search_paths_resolved_from_disk() {
    let fixture = Fixture::new();
    let fs = fixture.filesystem(Arc::new(ResolverRegistry::new()));

    assert_eq!(fs.name().await.as_deref(), Some("Integration Mod"));
    assert_eq!(fs.app_id().await, Some(620));

    let paths = fs.search_paths().await;
    let summary: Vec<(ProviderKind, &str)> = paths
        .iter()
        .map(|e| (e.provider.kind(), e.provider.location()))
        .collect();
    assert_eq!(summary.len(), 6, "{:?}", summary);

    assert_eq!(summary[0].0, ProviderKind::Folder);
    assert!(summary[0].1.ends_with("Portal 2/portal2"));
    assert_eq!(summary[1].0, ProviderKind::Archive);
    assert!(summary[1].1.ends_with("portal2/pak01_dir.vpk"));
    // Glob expansion: folder then single-file archive, sorted
    assert_eq!(summary[2].0, ProviderKind::Folder);
    assert!(summary[2].1.ends_with("custom/a"));
    assert_eq!(summary[3].0, ProviderKind::Archive);
    assert!(summary[3].1.ends_with("custom/extra.vpk"));
    assert!(summary[4].1.ends_with("Portal 2/platform"));
    assert!(summary[5].1.ends_with("tf/tf2_misc_dir.vpk"));
    assert_eq!(paths[5].qualifiers, vec![MOUNT_QUALIFIER.to_string()]);
}

#[tokio::test]
async fn test_reads_every_storage_layout() {
    let fixture = Fixture::new();
    let fs = fixture.filesystem(Arc::new(ResolverRegistry::new()));

    let expected: &[(&str, Option<&str>)] = &[
        ("/scripts/loose.txt", Some("loose")),
        ("/scripts/chunked.txt", Some("head:chunk body")),
        ("/scripts/inline.txt", Some("inline body")),
        ("/scripts/preload.txt", Some("all preload")),
        ("/bin/tool", Some("no extension")),
        ("/custom.txt", Some("custom folder")),
        ("/models/single.mdl", Some("single file")),
        ("/platform.txt", Some("platform")),
        ("/maps/mounted.bsp", Some("mounted map")),
        ("/nope.txt", None),
    ];
    for (path, contents) in expected {
        assert_eq!(
            fs.read_file(path, None, false).await,
            contents.map(|c| Bytes::copy_from_slice(c.as_bytes())),
            "{}",
            path
        );
    }
}

#[tokio::test]
async fn test_precedence_and_qualifiers() {
    let fixture = Fixture::new();
    let fs = fixture.filesystem(Arc::new(ResolverRegistry::new()));

    assert_eq!(
        fs.read_file("/shared.txt", None, false).await,
        Some(Bytes::from("from folder"))
    );
    assert_eq!(
        fs.read_file("/shared.txt", None, true).await,
        Some(Bytes::from("from archive"))
    );
    assert_eq!(fs.stat("/shared.txt", None).await.map(|s| s.size), Some(12));

    let which = fs.get_path("/shared.txt", None, false).await.unwrap();
    assert!(which.ends_with("portal2/shared.txt"));
    let which = fs.get_path("/shared.txt", None, true).await.unwrap();
    assert!(which.ends_with("pak01_dir.vpk"));

    assert_eq!(fs.read_file("/platform.txt", Some("game"), false).await, None);
    assert!(fs.read_file("/platform.txt", Some("platform"), false).await.is_some());
    assert!(fs.read_file("/maps/mounted.bsp", Some("game"), false).await.is_none());
    assert!(fs
        .read_file("/maps/mounted.bsp", Some(MOUNT_QUALIFIER), false)
        .await
        .is_some());
}

#[tokio::test]
async fn test_directory_union() {
    let fixture = Fixture::new();
    let fs = fixture.filesystem(Arc::new(ResolverRegistry::new()));

    let scripts = fs.read_directory("/scripts", None).await.unwrap();
    let names: Vec<&str> = scripts.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(
        names,
        vec!["loose.txt", "chunked.txt", "inline.txt", "preload.txt"]
    );

    let root = fs.read_directory("/", Some("game")).await.unwrap();
    let shared = root.iter().filter(|e| e.name == "shared.txt").count();
    assert_eq!(shared, 1);
    assert!(root.iter().any(|e| e.name == "bin" && e.kind == FileKind::Directory));

    assert_eq!(
        fs.stat("/maps", None).await.map(|s| s.kind),
        Some(FileKind::Directory)
    );
    assert!(fs.read_directory("/does/not/exist", None).await.is_none());
}

#[tokio::test]
async fn test_missing_chunk_leaves_siblings_readable() {
    let fixture = Fixture::new();
    std::fs::remove_file(fixture.path("pak01_001.vpk")).unwrap();
    let fs = fixture.filesystem(Arc::new(ResolverRegistry::new()));

    assert_eq!(fs.read_file("/scripts/chunked.txt", None, false).await, None);
    assert_eq!(
        fs.read_file("/scripts/inline.txt", None, false).await,
        Some(Bytes::from("inline body"))
    );
    assert!(fs.stat("/scripts/chunked.txt", None).await.is_some());
}

#[tokio::test]
async fn test_missing_gameinfo_until_reload() {
    let fixture = Fixture::new();
    let gameinfo = fixture.path("gameinfo.txt");
    let saved = std::fs::read(&gameinfo).unwrap();
    std::fs::remove_file(&gameinfo).unwrap();

    let fs = fixture.filesystem(Arc::new(ResolverRegistry::new()));
    assert!(fs.read_file("/scripts/loose.txt", None, false).await.is_none());

    std::fs::write(&gameinfo, saved).unwrap();
    assert!(fs.read_file("/scripts/loose.txt", None, false).await.is_none());
    assert!(!fs.is_ready());

    assert!(fs.reload().await.is_ok());
    assert!(fs.read_file("/scripts/loose.txt", None, false).await.is_some());
}

#[tokio::test]
async fn test_archive_reader_verify_on_disk() {
    let fixture = Fixture::new();
    let source: Arc<dyn StorageSource> = Arc::new(DiskSource::new());
    let reader = ArchiveReader::new(source, slash(&fixture.path("pak01_dir.vpk")));

    assert_eq!(reader.file_count().await, 5);
    assert_eq!(reader.header().map(|h| h.version), Some(2));
    for path in reader.paths().await {
        assert_eq!(reader.verify(&path).await, Some(true), "{}", path);
    }
    assert!(reader.cached_chunks() >= 2);
}

#[test]
fn test_fixture_encoder_matches_parser() {
    let raw = VpkBuilder::new(1)
        .file("/a.txt", b"PR", b"", Placement::Chunk(0))
        .file("/b.txt", b"", b"DATA", Placement::Inline)
        .directory_bytes();
    let index = parse_index(Bytes::from(raw.clone())).unwrap();

    // "txt\0 \0" + two names, records and preload, then three terminators
    let tree_size = 6 + (2 + RECORD_LEN + 2) + (2 + RECORD_LEN) + 3;
    assert_eq!(index.header.tree_size as usize, tree_size);
    assert_eq!(&index.files["/a.txt"].preload[..], b"PR");

    let inline = &index.files["/b.txt"];
    let start = index.header.tree_size as usize + inline.offset as usize;
    assert_eq!(&raw[start..start + inline.length as usize], b"DATA");
}

#[tokio::test]
async fn test_registry_shared_between_filesystems() {
    let fixture = Fixture::new();
    let registry = Arc::new(ResolverRegistry::new());
    let source: Arc<dyn StorageSource> = Arc::new(DiskSource::new());

    let make = || {
        GameFilesystem::new(
            Arc::clone(&source),
            slash(&fixture.mod_root),
            Arc::clone(&registry),
            SteamConfig::new(slash(&fixture.steam)),
        )
    };
    let (a, b) = (make(), make());
    assert!(a.parse().await.is_ok());
    assert!(b.parse().await.is_ok());
    assert_eq!(registry.len(), 1);

    let resolver = registry.resolver(&source, &slash(&fixture.steam));
    assert_eq!(resolver.installed().await, vec![440, 620, 730]);
    assert!(resolver.resolve(730, false).await.is_none());
    let tf = resolver.resolve(440, false).await.unwrap();
    assert!(Path::new(&tf).join("tf").join("tf2_misc_dir.vpk").exists());
}
