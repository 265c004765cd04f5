//! End-to-end tests for the generation pipeline
//!
//! Runs the built-in compiler over the blog fixtures in `tests/fixtures/models`
//! and over small in-memory schemas.

use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};

use slang_composites::compiler::{Composite, FieldKind, RelationSource};
use slang_composites::merge::{merge_artifact_files, read_index};
use slang_composites::relations::RelationKind;
use slang_composites::{
    BuildOrder, ComposeError, ComposerConfig, CompilerError, CompositeCompiler, LocalCompiler,
    MergedDefinition, Orchestrator, Pipeline, SchemaFile,
};
use tempfile::tempdir;

/// Local compiler that keeps every text it receives
#[derive(Default)]
struct RecordingCompiler {
    inputs: RefCell<Vec<String>>,
}

impl CompositeCompiler for RecordingCompiler {
    fn compile(&self, schema: &str, index: bool) -> Result<Composite, CompilerError> {
        self.inputs.borrow_mut().push(schema.to_string());
        LocalCompiler.compile(schema, index)
    }

    fn start_indexing(&self, definition: &MergedDefinition) -> Result<(), CompilerError> {
        LocalCompiler.start_indexing(definition)
    }
}

fn fixtures_path() -> &'static Path {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/models").leak()
}

fn config_in(root: &Path, models: &Path) -> ComposerConfig {
    let mut config = ComposerConfig::default();
    config.paths.output_dir = root.join("__generated__");
    config.paths.model_dir = models.to_path_buf();
    config.paths.relational_folder = root.to_path_buf();
    config
}

fn model(path: &str, body: &str) -> SchemaFile {
    SchemaFile::new(path, body)
}

// =============================================================================
// Full pipeline over fixtures
// =============================================================================

#[test]
fn test_blog_fixtures_generate_every_output() {
    let dir = tempdir().unwrap();
    let config = config_in(dir.path(), fixtures_path());
    let report = Pipeline::new(config.clone(), LocalCompiler).run().unwrap();

    let order: Vec<_> = report
        .build_order
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(
        order,
        vec!["0_shared.graphql", "1_author.graphql", "2_post.graphql", "3_comment.graphql"]
    );

    let composites = config.composite_dir();
    assert_eq!(
        report.artifacts,
        vec![
            composites.join("Author.json"),
            composites.join("Post.json"),
            composites.join("Comment.json"),
            composites.join("Discussion.json"),
        ]
    );
    assert_eq!(read_index(composites.join("index.json")).unwrap(), report.definition);

    let runtime = fs::read_to_string(composites.join("definition.ts")).unwrap();
    assert!(runtime.contains("export const definition = {"));
    let schema = fs::read_to_string(config.paths.output_dir.join("schema.graphql")).unwrap();
    assert!(schema.contains("type Discussion {"));

    let mutations = fs::read_to_string(config.paths.output_dir.join("mutations.ts")).unwrap();
    assert!(mutations.contains("export const CreateDiscussionDocument"));

    for file in ["Author.ts", "Post.ts", "Comment.ts", "Discussion.ts", "index.ts", "utils.ts"] {
        assert!(config.client_dir().join(file).exists(), "missing client file {}", file);
    }

    let prisma = fs::read_to_string(dir.path().join("schema.prisma")).unwrap();
    let author_id = &report.definition.models["Author"].id;
    assert!(prisma.contains(&format!("@@map(\"{}\")", author_id)));
    assert!(prisma.contains("posts PostStream[] @relation(name: \"post_authorid\")"));
    assert!(prisma.contains("custom_authorID String"));
    assert!(prisma.contains("comments CommentStream[] @relation(name: \"comment_postid\")"));
    assert!(prisma.contains("discussions DiscussionStream[] @relation(name: \"discussion_postid\")"));
    assert!(prisma.contains("comments CommentStream[] @relation(\"discussion_postid_comments\")"));
}

#[test]
fn test_references_resolve_to_earlier_ids() {
    let dir = tempdir().unwrap();
    let report = Pipeline::new(config_in(dir.path(), fixtures_path()), LocalCompiler)
        .run()
        .unwrap();
    let definition = &report.definition;

    let author = definition.models["Author"].fields["address"].clone();
    assert_eq!(author.kind, FieldKind::Reference);

    let post_author = definition.models["Post"].fields["author"].relation.clone().unwrap();
    assert_eq!(post_author.source, RelationSource::Document);
    assert_eq!(post_author.model, definition.models["Author"].id);

    let comments = definition.models["Discussion"].fields["comments"].relation.clone().unwrap();
    assert_eq!(comments.source, RelationSource::QueryConnection);
    assert_eq!(comments.model, definition.models["Comment"].id);
}

#[test]
fn test_compiler_never_sees_placeholders() {
    let dir = tempdir().unwrap();
    let compiler = RecordingCompiler::default();
    let report = Pipeline::new(config_in(dir.path(), fixtures_path()), &compiler)
        .run()
        .unwrap();

    let inputs = compiler.inputs.borrow();
    assert_eq!(inputs.len(), report.artifacts.len());
    for text in inputs.iter() {
        assert!(!text.contains("${"), "unresolved placeholder in:\n{}", text);
    }

    // Byline is declared in the post file and shared with the comment file
    let author_id = &report.definition.models["Author"].id;
    let byline = format!("@documentReference(model: \"{}\")", author_id);
    let comment_input = inputs.iter().find(|t| t.contains("type Comment @createModel")).unwrap();
    assert!(comment_input.contains("type Byline {"));
    assert!(comment_input.contains(&byline));
    assert_eq!(
        report.definition.models["Comment"].fields["byline"].kind,
        FieldKind::Reference
    );
}

#[test]
fn test_relation_duality() {
    let dir = tempdir().unwrap();
    let report = Pipeline::new(config_in(dir.path(), fixtures_path()), LocalCompiler)
        .run()
        .unwrap();
    let graph = report.relations.unwrap();

    // Each document link pairs one foreign key with one inverse on its target
    let mut foreign_keys = 0;
    for (model, table) in &graph.models {
        for relation in table.relations() {
            if !matches!(relation.kind, RelationKind::ForeignKey { .. }) {
                continue;
            }
            foreign_keys += 1;
            let sides: Vec<_> = graph.with_label(&relation.label).collect();
            assert_eq!(sides.len(), 2, "label {}", relation.label);
            let inverse: Vec<_> = sides
                .iter()
                .filter(|(_, r)| r.kind == RelationKind::Inverse)
                .collect();
            assert_eq!(inverse.len(), 1, "label {}", relation.label);
            assert_eq!(inverse[0].0, relation.target);
            assert_eq!(&inverse[0].1.target, model);
        }
    }
    assert_eq!(foreign_keys, 3);

    let authored: Vec<_> = graph.with_label("post_authorid").map(|(m, _)| m).collect();
    assert_eq!(authored, vec!["Author", "Post"]);

    // Post is linked twice through postID, under separate labels
    let post_inverses: Vec<_> = graph
        .get("Post")
        .unwrap()
        .relations()
        .filter(|r| r.kind == RelationKind::Inverse)
        .map(|r| (r.field.as_str(), r.label.as_str()))
        .collect();
    assert_eq!(
        post_inverses,
        vec![("comments", "comment_postid"), ("discussions", "discussion_postid")]
    );

    let connection: Vec<_> = graph.with_label("discussion_postid_comments").collect();
    assert_eq!(connection.len(), 1);
    assert_eq!(connection[0].1.kind, RelationKind::Connection);

    // Connections get no reciprocal side on their target
    assert!(graph
        .get("Comment")
        .unwrap()
        .relations()
        .all(|r| r.kind != RelationKind::Inverse));
}

#[test]
fn test_builds_are_deterministic() {
    let first = tempdir().unwrap();
    let second = tempdir().unwrap();
    let a = Pipeline::new(config_in(first.path(), fixtures_path()), LocalCompiler)
        .run()
        .unwrap();
    let b = Pipeline::new(config_in(second.path(), fixtures_path()), LocalCompiler)
        .run()
        .unwrap();

    assert_eq!(a.definition, b.definition);
    assert_eq!(a.relations, b.relations);
    assert_eq!(
        fs::read_to_string(first.path().join("schema.prisma")).unwrap(),
        fs::read_to_string(second.path().join("schema.prisma")).unwrap()
    );
}

#[test]
fn test_merge_from_written_artifacts() {
    let dir = tempdir().unwrap();
    let report = Pipeline::new(config_in(dir.path(), fixtures_path()), LocalCompiler)
        .run()
        .unwrap();
    assert_eq!(merge_artifact_files(&report.artifacts).unwrap(), report.definition);
}

// =============================================================================
// Ordering and failures
// =============================================================================

#[test]
fn test_dependency_plan_reorders_files() {
    let dir = tempdir().unwrap();
    let files = vec![
        model(
            "a_post.graphql",
            "type Writer @loadModel(id: \"${Writer}\") { id: ID! }\n\
             type Post @createModel(accountRelation: LIST, description: \"p\") {\n\
               writerID: StreamID!\n\
               writer: Writer @relationDocument(property: \"writerID\")\n\
             }",
        ),
        model(
            "b_writer.graphql",
            "type Writer @createModel(accountRelation: SINGLE, description: \"w\") { name: String }",
        ),
    ];
    let report = Pipeline::new(config_in(dir.path(), dir.path()), LocalCompiler)
        .run_files(files)
        .unwrap();
    assert_eq!(
        report.build_order,
        vec![PathBuf::from("b_writer.graphql"), PathBuf::from("a_post.graphql")]
    );
}

#[test]
fn test_forward_reference_fails_fast_in_listing_order() {
    let dir = tempdir().unwrap();
    let mut config = config_in(dir.path(), dir.path());
    config.generate.build_order = BuildOrder::Listing;

    let files = vec![
        model(
            "A.graphql",
            "type B @loadModel(id: \"${B}\") { id: ID! }\n\
             type A @createModel(accountRelation: LIST, description: \"a\") { n: Int }",
        ),
        model(
            "B.graphql",
            "type B @createModel(accountRelation: LIST, description: \"b\") { n: Int }",
        ),
    ];
    match Pipeline::new(config.clone(), LocalCompiler).run_files(files) {
        Err(ComposeError::ForwardReference { file, model, .. }) => {
            assert_eq!(file, PathBuf::from("A.graphql"));
            assert_eq!(model, "B");
        }
        other => panic!("Expected forward reference, got {:?}", other.map(|r| r.artifacts)),
    }
    assert!(!config.composite_dir().join("A.json").exists());
    assert!(!config.composite_dir().join("B.json").exists());
}

#[test]
fn test_embed_declared_in_later_file_is_not_visible_earlier() {
    let files = vec![
        model(
            "1_home.graphql",
            "type Home @createModel(accountRelation: LIST, description: \"h\") { address: Address }",
        ),
        model("2_shared.graphql", "type Address { city: String }"),
    ];
    match Orchestrator::new(LocalCompiler).build(&files) {
        Err(ComposeError::Compiler { model, file, source }) => {
            assert_eq!(model, "Home");
            assert_eq!(file, PathBuf::from("1_home.graphql"));
            assert!(matches!(
                source,
                CompilerError::UnknownType { ref type_name, .. } if type_name == "Address"
            ));
        }
        other => panic!("Expected unknown type, got {:?}", other.map(|c| c.registry.len())),
    }
}

#[test]
fn test_duplicate_model_names_fail() {
    let dir = tempdir().unwrap();
    let files = vec![
        model("a.graphql", "type Note @createModel(accountRelation: LIST, description: \"a\") { n: Int }"),
        model("b.graphql", "type Note @createModel(accountRelation: LIST, description: \"b\") { m: Int }"),
    ];
    let result = Pipeline::new(config_in(dir.path(), dir.path()), LocalCompiler).run_files(files);
    assert!(matches!(
        result,
        Err(ComposeError::DuplicateModel { ref model, .. }) if model == "Note"
    ));
}

#[test]
fn test_parse_error_names_file() {
    let dir = tempdir().unwrap();
    let files = vec![model("broken.graphql", "type Note @createModel {")];
    match Pipeline::new(config_in(dir.path(), dir.path()), LocalCompiler).run_files(files) {
        Err(ComposeError::Parse { file, .. }) => assert_eq!(file, PathBuf::from("broken.graphql")),
        other => panic!("Expected parse error, got {:?}", other.map(|r| r.artifacts)),
    }
}
