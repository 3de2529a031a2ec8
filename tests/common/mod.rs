use std::path::Path;
use structure_editor::nbt::{encode_gzip, Compound, NbtFile, Tag, TagKind, TagList};
use structure_editor::session::{Session, SessionConfig};
use tempfile::TempDir;
use tokio::io::BufReader;

/// Fresh scratch directory, removed when the guard drops.
pub fn scratch_dir() -> TempDir {
    TempDir::new().unwrap()
}

pub fn int_list(values: &[i32]) -> Tag {
    Tag::List(TagList::new(TagKind::Int, values.iter().map(|v| Tag::Int(*v)).collect()).unwrap())
}

fn compound_list(items: Vec<Compound>) -> Tag {
    if items.is_empty() {
        return Tag::List(TagList::empty(TagKind::Compound));
    }
    Tag::List(TagList::new(TagKind::Compound, items.into_iter().map(Tag::Compound).collect()).unwrap())
}

pub fn block(pos: [i32; 3], state: i32) -> Compound {
    let mut block = Compound::new();
    block.insert("pos".to_owned(), int_list(&pos));
    block.insert("state".to_owned(), Tag::Int(state));
    block
}

pub fn palette(names: &[&str]) -> Tag {
    compound_list(
        names
            .iter()
            .map(|name| {
                let mut state = Compound::new();
                state.insert("Name".to_owned(), Tag::String((*name).to_owned()));
                state
            })
            .collect(),
    )
}

pub fn structure_root(palette_names: &[&str], blocks: Vec<Compound>) -> Compound {
    let mut root = Compound::new();
    root.insert("DataVersion".to_owned(), Tag::Int(1343));
    root.insert("author".to_owned(), Tag::String("original".to_owned()));
    root.insert("size".to_owned(), int_list(&[3, 3, 3]));
    root.insert("palette".to_owned(), palette(palette_names));
    root.insert("blocks".to_owned(), compound_list(blocks));
    root.insert("entities".to_owned(), compound_list(vec![]));
    root
}

/// Writes `root` as a gzip structure file.
pub async fn write_structure(path: &Path, root: Compound) {
    let bytes = encode_gzip(&NbtFile::new(String::new(), Tag::Compound(root))).unwrap();
    tokio::fs::write(path, bytes).await.unwrap();
}

/// Runs a whole scripted session in `dir` and returns its output.
pub async fn run_script(dir: &Path, script: &str) -> String {
    let config = SessionConfig {
        author: "Integration".to_owned(),
        source: dir.to_path_buf(),
        origin: [0, 0, 0],
    };
    let mut session = Session::new(BufReader::new(script.as_bytes()), Vec::new(), config)
        .with_confirmation_codes(|| "007".to_owned());
    session.run().await.unwrap();
    String::from_utf8(session.into_output()).unwrap()
}
