use entities::ENTITIES;
use std::io::Write;
use std::{env, path::PathBuf};

fn main() {
    let out_dir: PathBuf = env::var("OUT_DIR").unwrap().parse().unwrap();

    // entity::lookup is handed the inner name only, like "amp" for "&amp;".
    // entities::ENTITIES lists most names both with and without the trailing
    // ";"; only the terminated spellings are valid in CommonMark.
    let mut map = phf_codegen::Map::new();
    let mut seen = std::collections::HashSet::new();
    for e in ENTITIES.iter() {
        if !(e.entity.starts_with('&') && e.entity.ends_with(';')) {
            continue;
        }
        let name = &e.entity[1..e.entity.len() - 1];
        if seen.insert(name) {
            map.entry(name, &format!("{:?}", e.characters));
        }
    }

    let out = std::fs::File::create(out_dir.join("entitydata.rs")).unwrap();
    let mut bw = std::io::BufWriter::new(out);
    writeln!(
        bw,
        "static TRANSLATED_ENTITIES: phf::Map<&'static str, &'static str> = {};",
        map.build()
    )
    .unwrap();
    println!("cargo:rerun-if-changed=build.rs");
}
