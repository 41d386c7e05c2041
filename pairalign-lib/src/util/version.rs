pub mod built_info {
    use lazy_static::lazy_static;

    // The file has been placed there by the build script.
    include!(concat!(env!("OUT_DIR"), "/built.rs"));

    /// The package version, suffixed with the short git commit when built from a repository.
    fn get_software_version() -> String {
        match GIT_COMMIT_HASH {
            Some(hash) => format!("{}-{}", PKG_VERSION, &hash[..hash.len().min(7)]),
            None => PKG_VERSION.to_string(),
        }
    }

    lazy_static! {
        pub static ref VERSION: String = get_software_version();
    }
}
