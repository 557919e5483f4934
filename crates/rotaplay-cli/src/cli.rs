//! Command-line argument parsing for rotaplay.

use std::path::PathBuf;

use clap::Parser;
use rotaplay_core::OrderKind;


/// rotaplay - Endless shuffled rotation over a media folder.
#[derive( Parser, Debug )]
#[command( name = "rotaplay" )]
#[command( version, about, long_about = None )]
pub struct Args {
    /// Directory to scan for media.
    pub root: PathBuf,

    /// Settings file (defaults to the user config directory).
    #[arg( short, long )]
    pub config: Option<PathBuf>,

    /// Cycle order: random, alphabetical or keep.
    #[arg( short, long )]
    pub order: Option<OrderKind>,

    /// Extra media extension to recognize (repeatable), e.g. `.webm`.
    #[arg( short, long = "ext" )]
    pub ext: Vec<String>,

    /// Play through N items without prompting, then exit.
    #[arg( long, value_name = "N" )]
    pub play: Option<usize>,

    /// Milliseconds spent on each item in `--play` mode.
    #[arg( long, default_value_t = 1000 )]
    pub interval: u64,

    /// Enable debug logging.
    #[arg( short, long )]
    pub verbose: bool,
}


#[cfg( test )]
mod tests {
    use super::*;


    #[test]
    fn test_parse_minimal() {
        let args = Args::try_parse_from([ "rotaplay", "/media" ]).unwrap();
        assert_eq!( args.root, PathBuf::from( "/media" ) );
        assert!( args.order.is_none() );
        assert!( args.ext.is_empty() );
        assert_eq!( args.interval, 1000 );
        assert!( args.play.is_none() );
    }


    #[test]
    fn test_parse_full() {
        let args = Args::try_parse_from([
            "rotaplay", "-o", "alphabetical", "-e", ".webm", "--ext", "mov",
            "--play", "3", "--interval", "10", "-v", "/media",
        ]).unwrap();
        assert_eq!( args.order, Some( OrderKind::Alphabetical ) );
        assert_eq!( args.ext, vec![ ".webm".to_string(), "mov".to_string() ] );
        assert_eq!( args.play, Some( 3 ) );
        assert_eq!( args.interval, 10 );
        assert!( args.verbose );
    }


    #[test]
    fn test_parse_bad_order() {
        assert!( Args::try_parse_from([ "rotaplay", "-o", "sideways", "/media" ]).is_err() );
    }


    #[test]
    fn test_root_required() {
        assert!( Args::try_parse_from([ "rotaplay" ]).is_err() );
    }
}
