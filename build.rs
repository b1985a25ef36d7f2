fn main(){
    let crate_dir = std::env::var("CARGO_MANIFEST_DIR").unwrap();

    let mut config = cbindgen::Config::default();
    config.language = cbindgen::Language::C;
    config.include_guard = Some("TILTDRIVE_H".to_string());

    //header is a convenience for C hosts, a parse failure must not break the rust build
    match cbindgen::Builder::new()
        .with_crate(crate_dir)
        .with_config(config)
        .generate()
    {
        Ok(bindings) =>{
            bindings.write_to_file("include/tiltdrive.h");
        }
        Err(e) =>{
            println!("cargo:warning=unable to generate C bindings: {}", e);
        }
    }
}
