//! Media discovery
//!
//! Walks a directory tree and collects the files whose extension is in a
//! configured set. Collection performs no ordering.

use std::collections::BTreeSet;
use std::io;
use std::path::{ Path, PathBuf };

use serde::{ Deserialize, Serialize };
use thiserror::Error;
use walkdir::WalkDir;


/// Extensions recognized when no configuration says otherwise.
pub const DEFAULT_EXTENSIONS: &[&str] = &[ ".avi", ".mp4", ".mkv" ];


/// Errors that can occur while scanning for media.
#[derive( Debug, Error )]
pub enum ScanError {
    #[error( "Path not found: {path}" )]
    NotFound {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error( "Access denied: {path}" )]
    AccessDenied {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error( "IO error: {0}" )]
    Io( #[from] io::Error ),
}


impl ScanError {
    /// Classifies a filesystem error raised while visiting `path`.
    fn from_io( path: Option<PathBuf>, source: io::Error ) -> Self {
        match ( source.kind(), path ) {
            ( io::ErrorKind::NotFound, Some( path ) ) => ScanError::NotFound { path, source },
            ( io::ErrorKind::PermissionDenied, Some( path ) ) => ScanError::AccessDenied { path, source },
            _ => ScanError::Io( source ),
        }
    }


    /// Gets the path the error occurred on, if known.
    pub fn path( &self ) -> Option<&Path> {
        match self {
            ScanError::NotFound { path, .. } | ScanError::AccessDenied { path, .. } => Some( path ),
            ScanError::Io( _ ) => None,
        }
    }
}


impl From<walkdir::Error> for ScanError {
    fn from( err: walkdir::Error ) -> Self {
        let path = err.path().map( Path::to_path_buf );
        // Symlink loops carry no io::Error; wrap the walkdir error itself.
        let source = if err.io_error().is_some() {
            err.into_io_error().unwrap_or_else( || io::Error::other( "directory walk failed" ) )
        } else {
            err.into()
        };
        Self::from_io( path, source )
    }
}


/// Set of recognized media extensions.
///
/// Entries include the leading dot and are compared case-sensitively, so
/// `.mp4` matches `clip.mp4` but not `clip.MP4`.
#[derive( Debug, Clone, PartialEq, Eq, Serialize, Deserialize )]
#[serde( from = "Vec<String>", into = "Vec<String>" )]
pub struct MediaExtensions {
    entries: BTreeSet<String>,
}


impl MediaExtensions {
    /// Creates an empty set. Nothing matches until entries are added.
    pub fn empty() -> Self {
        Self { entries: BTreeSet::new() }
    }


    /// Adds an extension, returning the extended set.
    ///
    /// A missing leading dot is added, so `"webm"` and `".webm"` are equivalent.
    pub fn with( mut self, ext: impl AsRef<str> ) -> Self {
        self.insert( ext );
        self
    }


    /// Adds an extension in place.
    pub fn insert( &mut self, ext: impl AsRef<str> ) {
        let ext = ext.as_ref();
        if ext.is_empty() {
            return;
        }
        let ext = if ext.starts_with( '.' ) {
            ext.to_string()
        } else {
            format!( ".{}", ext )
        };
        self.entries.insert( ext );
    }


    /// Returns true if the file's extension is in the set.
    ///
    /// The extension runs from the last `.` of the file name, so a dotfile
    /// named `.mp4` has extension `.mp4`.
    pub fn matches( &self, path: &Path ) -> bool {
        path.file_name()
            .and_then( |n| n.to_str() )
            .and_then( |n| n.rfind( '.' ).map( |i| &n[ i.. ] ) )
            .map( |ext| self.entries.contains( ext ) )
            .unwrap_or( false )
    }


    /// Iterates the configured entries in sorted order.
    pub fn iter( &self ) -> impl Iterator<Item = &str> {
        self.entries.iter().map( String::as_str )
    }


    pub fn len( &self ) -> usize {
        self.entries.len()
    }


    pub fn is_empty( &self ) -> bool {
        self.entries.is_empty()
    }
}


impl Default for MediaExtensions {
    fn default() -> Self {
        DEFAULT_EXTENSIONS.iter().fold( Self::empty(), |set, ext| set.with( ext ) )
    }
}


impl<S: AsRef<str>> FromIterator<S> for MediaExtensions {
    fn from_iter<I: IntoIterator<Item = S>>( iter: I ) -> Self {
        let mut set = Self::empty();
        for ext in iter {
            set.insert( ext );
        }
        set
    }
}


impl From<Vec<String>> for MediaExtensions {
    fn from( entries: Vec<String> ) -> Self {
        entries.into_iter().collect()
    }
}


impl From<MediaExtensions> for Vec<String> {
    fn from( set: MediaExtensions ) -> Self {
        set.entries.into_iter().collect()
    }
}


/// Recursive media file collector.
#[derive( Debug, Clone, Default )]
pub struct MediaCollector {
    extensions: MediaExtensions,
}


impl MediaCollector {
    /// Creates a collector recognizing the given extensions.
    pub fn new( extensions: MediaExtensions ) -> Self {
        Self { extensions }
    }


    /// Gets the recognized extensions.
    pub fn extensions( &self ) -> &MediaExtensions {
        &self.extensions
    }


    /// Collects every regular file under `root` with a recognized extension.
    ///
    /// Symbolic links are not followed. Any error during the walk aborts the
    /// scan; the result order is whatever the filesystem yields.
    pub fn collect( &self, root: &Path ) -> Result<Vec<PathBuf>, ScanError> {
        tracing::info!( "Scanning: {:?}", root );

        let mut found = Vec::new();
        for entry in WalkDir::new( root ).follow_links( false ) {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }
            if self.extensions.matches( entry.path() ) {
                found.push( entry.into_path() );
            }
        }

        tracing::info!( "Found {} media files under {:?}", found.len(), root );
        Ok( found )
    }
}


#[cfg( test )]
mod tests {
    use super::*;

    use std::fs;


    fn touch( root: &Path, rel: &str ) -> PathBuf {
        let path = root.join( rel );
        if let Some( parent ) = path.parent() {
            fs::create_dir_all( parent ).unwrap();
        }
        fs::write( &path, b"" ).unwrap();
        path
    }


    #[test]
    fn test_default_extensions() {
        let set = MediaExtensions::default();
        assert_eq!( set.iter().collect::<Vec<_>>(), vec![ ".avi", ".mkv", ".mp4" ] );
        assert!( set.matches( Path::new( "/media/show.mkv" ) ) );
        assert!( set.matches( Path::new( "movie.avi" ) ) );
        assert!( !set.matches( Path::new( "notes.txt" ) ) );
        assert!( !set.matches( Path::new( "README" ) ) );
    }


    #[test]
    fn test_matching_is_case_sensitive() {
        let set = MediaExtensions::default();
        assert!( !set.matches( Path::new( "clip.MP4" ) ) );
        assert!( !set.matches( Path::new( "clip.Mkv" ) ) );
    }


    #[test]
    fn test_with_normalizes_leading_dot() {
        let set = MediaExtensions::empty().with( "webm" ).with( ".mov" ).with( "" );
        assert_eq!( set.len(), 2 );
        assert!( set.matches( Path::new( "a.webm" ) ) );
        assert!( set.matches( Path::new( "a.mov" ) ) );
        assert!( !set.matches( Path::new( "a.mp4" ) ) );
    }


    #[test]
    fn test_independent_sets() {
        let video = MediaExtensions::default();
        let audio: MediaExtensions = [ ".mp3", ".flac" ].into_iter().collect();
        assert!( video.matches( Path::new( "x.mp4" ) ) );
        assert!( !audio.matches( Path::new( "x.mp4" ) ) );
        assert!( audio.matches( Path::new( "x.flac" ) ) );
    }


    #[test]
    fn test_extensions_serde() {
        let set: MediaExtensions = serde_json::from_str( r#"["mp4", ".ogv"]"# ).unwrap();
        assert!( set.matches( Path::new( "a.ogv" ) ) );
        assert_eq!( serde_json::to_string( &set ).unwrap(), r#"[".mp4",".ogv"]"# );
    }


    #[test]
    fn test_collect_recursive_and_filtered() {
        let dir = tempfile::tempdir().unwrap();
        let a = touch( dir.path(), "a.mp4" );
        let b = touch( dir.path(), "season1/b.mkv" );
        let c = touch( dir.path(), "season1/extras/deep/c.avi" );
        touch( dir.path(), "season1/cover.jpg" );
        touch( dir.path(), "upper.MP4" );
        fs::create_dir_all( dir.path().join( "empty.mp4" ) ).unwrap();

        let mut found = MediaCollector::default().collect( dir.path() ).unwrap();
        found.sort();
        let mut expected = vec![ a, b, c ];
        expected.sort();
        assert_eq!( found, expected );
    }


    #[test]
    fn test_collect_dotfile_media() {
        let dir = tempfile::tempdir().unwrap();
        let hidden = touch( dir.path(), ".mp4" );
        touch( dir.path(), ".hidden" );

        let found = MediaCollector::default().collect( dir.path() ).unwrap();
        assert_eq!( found, vec![ hidden ] );
    }


    #[test]
    fn test_matches_uses_last_dot() {
        let set = MediaExtensions::default();
        assert!( set.matches( Path::new( "/media/.mkv" ) ) );
        assert!( set.matches( Path::new( "show.s01e01.mkv" ) ) );
        assert!( !set.matches( Path::new( "clip.mp4.part" ) ) );
        assert!( !set.matches( Path::new( "/media.mp4/readme" ) ) );
    }


    #[test]
    fn test_collect_custom_extensions() {
        let dir = tempfile::tempdir().unwrap();
        touch( dir.path(), "a.mp4" );
        let webm = touch( dir.path(), "b.webm" );

        let collector = MediaCollector::new( MediaExtensions::empty().with( ".webm" ) );
        assert_eq!( collector.extensions().iter().collect::<Vec<_>>(), vec![ ".webm" ] );
        assert_eq!( collector.collect( dir.path() ).unwrap(), vec![ webm ] );
    }


    #[test]
    fn test_collect_empty_directory() {
        let dir = tempfile::tempdir().unwrap();
        assert!( MediaCollector::default().collect( dir.path() ).unwrap().is_empty() );
    }


    #[test]
    fn test_collect_missing_root() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join( "nope" );
        let err = MediaCollector::default().collect( &missing ).unwrap_err();
        assert!( matches!( err, ScanError::NotFound { ref path, .. } if *path == missing ) );
        assert_eq!( err.path(), Some( missing.as_path() ) );
    }


    #[test]
    fn test_collect_keeps_os_error_as_source() {
        use std::error::Error as _;

        let dir = tempfile::tempdir().unwrap();
        let err = MediaCollector::default().collect( &dir.path().join( "nope" ) ).unwrap_err();

        let source = err.source()
            .and_then( |s| s.downcast_ref::<io::Error>() )
            .unwrap();
        assert_eq!( source.kind(), io::ErrorKind::NotFound );
        assert!( source.raw_os_error().is_some() );
    }


    #[test]
    fn test_permission_denied_maps_to_access_denied() {
        use std::error::Error as _;

        let err = ScanError::from_io(
            Some( PathBuf::from( "/media/locked" ) ),
            io::Error::from( io::ErrorKind::PermissionDenied ),
        );
        assert!( matches!( err, ScanError::AccessDenied { .. } ) );
        assert_eq!( err.path(), Some( Path::new( "/media/locked" ) ) );
        assert_eq!( err.to_string(), "Access denied: /media/locked" );

        let source = err.source().and_then( |s| s.downcast_ref::<io::Error>() ).unwrap();
        assert_eq!( source.kind(), io::ErrorKind::PermissionDenied );
    }


    #[test]
    fn test_other_errors_map_to_io() {
        let err = ScanError::from_io(
            Some( PathBuf::from( "/media/disk" ) ),
            io::Error::from( io::ErrorKind::InvalidData ),
        );
        assert!( matches!( err, ScanError::Io( ref e ) if e.kind() == io::ErrorKind::InvalidData ) );
        assert_eq!( err.path(), None );

        let no_path = ScanError::from_io( None, io::Error::from( io::ErrorKind::NotFound ) );
        assert!( matches!( no_path, ScanError::Io( _ ) ) );
    }
}
