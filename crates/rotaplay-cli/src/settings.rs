//! Application settings management
//!
//! Settings live in a JSON file; every field is optional and falls back to
//! its default.

use std::fs;
use std::path::{ Path, PathBuf };

use anyhow::{ Context, Result };
use rotaplay_core::library::DEFAULT_EXTENSIONS;
use rotaplay_core::{ MediaExtensions, OrderKind };
use serde::{ Deserialize, Serialize };


/// Application settings.
#[derive( Debug, Clone, PartialEq, Serialize, Deserialize )]
#[serde( default )]
pub struct Settings {
    /// Recognized media extensions, including the leading dot
    pub extensions: Vec<String>,

    /// Ordering applied to each newly staged cycle
    pub order: OrderKind,

    /// Log filter used when `RUST_LOG` is not set
    pub log_filter: String,
}


impl Default for Settings {
    fn default() -> Self {
        Self {
            extensions: DEFAULT_EXTENSIONS.iter().map( |e| e.to_string() ).collect(),
            order: OrderKind::default(),
            log_filter: "info".to_string(),
        }
    }
}


impl Settings {
    /// Returns the default path to the settings file.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map( |p| p.join( "rotaplay" ).join( "settings.json" ) )
    }


    /// Loads settings from `path`, or returns defaults if the file does not exist.
    pub fn load_from( path: &Path ) -> Result<Self> {
        if !path.exists() {
            return Ok( Self::default() );
        }

        let contents = fs::read_to_string( path )
            .with_context( || format!( "Failed to read settings from {}", path.display() ) )?;
        serde_json::from_str( &contents )
            .with_context( || format!( "Invalid settings in {}", path.display() ) )
    }


    /// Builds the extension set described by these settings.
    pub fn media_extensions( &self ) -> MediaExtensions {
        self.extensions.iter().collect()
    }
}


#[cfg( test )]
mod tests {
    use super::*;


    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::load_from( &dir.path().join( "settings.json" ) ).unwrap();
        assert_eq!( settings, Settings::default() );
        assert_eq!( settings.media_extensions(), MediaExtensions::default() );
    }


    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join( "settings.json" );
        fs::write( &path, r#"{ "order": "alphabetical" }"# ).unwrap();

        let settings = Settings::load_from( &path ).unwrap();
        assert_eq!( settings.order, OrderKind::Alphabetical );
        assert_eq!( settings.log_filter, "info" );
        assert_eq!( settings.extensions.len(), DEFAULT_EXTENSIONS.len() );
    }


    #[test]
    fn test_custom_extensions() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join( "settings.json" );
        fs::write( &path, r#"{ "extensions": [".webm", "mov"], "log_filter": "debug" }"# ).unwrap();

        let settings = Settings::load_from( &path ).unwrap();
        let extensions = settings.media_extensions();
        assert!( extensions.matches( Path::new( "a.webm" ) ) );
        assert!( extensions.matches( Path::new( "a.mov" ) ) );
        assert!( !extensions.matches( Path::new( "a.mp4" ) ) );
        assert_eq!( settings.log_filter, "debug" );
    }


    #[test]
    fn test_invalid_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join( "settings.json" );
        fs::write( &path, "{ not json" ).unwrap();
        assert!( Settings::load_from( &path ).is_err() );
    }
}
