//! Client emitter
//!
//! Renders one service per model plus an aggregating client from templates
//! compiled into the binary.

use include_dir::{include_dir, Dir};

use super::{lower_first, GeneratedFile};
use crate::error::{ComposeError, Result};
use crate::merge::MergedDefinition;

static TEMPLATES: Dir<'static> = include_dir!("$CARGO_MANIFEST_DIR/templates/client");

fn template(name: &str) -> Result<&'static str> {
    TEMPLATES
        .get_file(name)
        .and_then(|file| file.contents_utf8())
        .ok_or_else(|| ComposeError::Template(name.to_string()))
}

/// Render the client files, relative to the client directory
pub fn render_client(definition: &MergedDefinition) -> Result<Vec<GeneratedFile>> {
    let service = template("service.ts.tmpl")?;
    let mut files = Vec::new();

    let mut imports = String::new();
    let mut properties = String::new();
    let mut constructor = String::new();
    for model in definition.model_names() {
        let lower = lower_first(model);
        files.push(GeneratedFile::new(
            format!("{}.ts", model),
            service
                .replace("${MODEL_NAME}", model)
                .replace("${MODEL_NAME_LOWERCASE}", &lower),
        ));
        imports.push_str(&format!("import {{ {}Service }} from './{}.js'\n", model, model));
        properties.push_str(&format!("  readonly {}: {}Service\n", lower, model));
        constructor.push_str(&format!("    this.{} = new {}Service(this)\n", lower, model));
    }

    let index = template("index.ts.tmpl")?
        .replace("${SERVICE_IMPORTS}", &imports)
        .replace("${SERVICE_PROPERTIES}", &properties)
        .replace("${SERVICE_CONSTRUCTOR}", &constructor);
    files.push(GeneratedFile::new("index.ts", index));
    files.push(GeneratedFile::new("utils.ts", template("utils.ts.tmpl")?));

    Ok(files)
}
