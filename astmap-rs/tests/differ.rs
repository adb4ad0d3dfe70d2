//! File-pair differencing over XML tree dumps.
//!
//! Fixtures live under `tests/fixtures/<case>/` as a `before.xml` and an
//! `after.xml` dump of the same source file.

use std::path::{Path, PathBuf};

use astmap::differ::{
    ClassCorrespondence, DeclarationCorrespondence, DeclarationKind, FragmentMapping,
    LocationPair, MethodCorrespondence, Refactoring,
};
use astmap::{LocationKey, NodeId, NodeKind, ProjectDiffer, Tree, TreeDumpParser};
use pretty_assertions::assert_eq;
use tracing_subscriber::EnvFilter;

const FILE: &str = "src/Foo.java";

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn fixture_dir(case: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(case)
}

/// Loads the before and after dumps of a fixture case.
fn load_case(case: &str) -> (Tree, Tree) {
    let dir = fixture_dir(case);
    let parser = TreeDumpParser::new().with_path(FILE);
    let before = parser
        .parse_file(dir.join("before.xml"))
        .unwrap_or_else(|e| panic!("{case}/before.xml: {e}"));
    let after = parser
        .parse_file(dir.join("after.xml"))
        .unwrap_or_else(|e| panic!("{case}/after.xml: {e}"));
    (before, after)
}

fn pair(src: (usize, usize), dst: (usize, usize)) -> LocationPair {
    LocationPair::new(
        LocationKey::new(FILE, src.0, src.1),
        LocationKey::new(FILE, dst.0, dst.1),
    )
}

fn at(tree: &Tree, pos: usize, length: usize) -> NodeId {
    tree.find_by_location(&LocationKey::new(FILE, pos, length))
        .unwrap_or_else(|| panic!("no node at {pos}+{length}"))
}

#[test]
fn test_extract_method() {
    init_tracing();
    let (before, after) = load_case("extract_method");
    assert_eq!(before.len(), 18);

    let class = ClassCorrespondence::new(FILE, FILE)
        .with_declaration(DeclarationCorrespondence::new(
            DeclarationKind::TypeDeclaration,
            pair((0, 80), (0, 130)),
        ))
        .with_method(
            MethodCorrespondence::new(pair((12, 66), (12, 58)))
                .with_fragment(FragmentMapping::leaf(pair((47, 13), (41, 13)))),
        )
        .with_refactoring(Refactoring::ExtractOperation {
            body: vec![FragmentMapping::leaf(pair((29, 13), (101, 13)))],
            argument_mappings: Vec::new(),
        });

    let diffs = ProjectDiffer::new()
        .with_src_tree(FILE, &before)
        .with_dst_tree(FILE, &after)
        .diff(&[class])
        .unwrap();
    assert_eq!(diffs.len(), 1);
    let diff = &diffs[0];
    let store = diff.mappings();

    // Every node of the old version survives somewhere.
    assert_eq!(diff.mono().len(), before.len());

    // The logging call moved into the extracted method.
    let moved = at(&before, 29, 13);
    assert_eq!(store.first_dst(moved), Some(at(&after, 101, 13)));
    let literal = before
        .find_first_of_kind(moved, NodeKind::StringLiteral)
        .unwrap();
    let literal_after = after
        .find_first_of_kind(at(&after, 101, 13), NodeKind::StringLiteral)
        .unwrap();
    assert!(store.contains(literal, literal_after));

    // The return statement stays put.
    assert!(store.contains(at(&before, 47, 13), at(&after, 41, 13)));

    // The new call and the extracted method are insertions.
    assert!(!store.is_dst_mapped(at(&after, 29, 8)));
    assert!(!store.is_dst_mapped(at(&after, 74, 54)));
}

// CompilationUnit
//   TypeDeclaration
//     SimpleName <name>
fn unit(name: &str, path: &str) -> Tree {
    let xml = format!(
        r#"<tree type="CompilationUnit" pos="0" length="20">
             <tree type="TypeDeclaration" pos="0" length="19">
               <tree type="SimpleName" label="{name}" pos="6" length="{len}"/>
             </tree>
           </tree>"#,
        len = name.len(),
    );
    TreeDumpParser::new().with_path(path).parse_str(&xml).unwrap()
}

#[test]
fn test_project_keeps_first_seen_order() {
    init_tracing();
    let (a_before, a_after) = (unit("A", "A.java"), unit("A", "A.java"));
    let (b_before, b_after) = (unit("B", "B.java"), unit("Bee", "B.java"));

    let type_pair = |file: &str| {
        DeclarationCorrespondence::new(
            DeclarationKind::TypeDeclaration,
            LocationPair::new(LocationKey::new(file, 0, 19), LocationKey::new(file, 0, 19)),
        )
    };
    let classes = [
        ClassCorrespondence::new("B.java", "B.java").with_declaration(type_pair("B.java")),
        ClassCorrespondence::new("A.java", "A.java").with_declaration(type_pair("A.java")),
    ];

    let diffs = ProjectDiffer::new()
        .with_src_tree("A.java", &a_before)
        .with_dst_tree("A.java", &a_after)
        .with_src_tree("B.java", &b_before)
        .with_dst_tree("B.java", &b_after)
        .diff(&classes)
        .unwrap();

    let paths: Vec<_> = diffs.iter().map(|d| d.src_path()).collect();
    assert_eq!(paths, vec!["B.java", "A.java"]);
    for diff in &diffs {
        assert_eq!(diff.mappings().len(), 3);
    }

    let renamed = diffs[0].mono();
    let name = b_before
        .find_first_of_kind(b_before.root(), NodeKind::SimpleName)
        .unwrap();
    let name_after = renamed.dst(name).unwrap();
    assert_eq!(b_after.label(name_after), "Bee");
}

#[test]
fn test_missing_fixture_is_an_io_error() {
    let result = TreeDumpParser::new().parse_file(fixture_dir("no_such_case").join("before.xml"));
    assert!(result.is_err());
}
