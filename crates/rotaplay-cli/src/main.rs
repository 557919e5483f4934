//! rotaplay CLI - Endless rotation over a media folder

mod cli;
mod settings;

use std::io::{ self, Write };
use std::path::Path;
use std::time::Duration;

use anyhow::{ Context, Result };
use clap::Parser;
use tokio::io::{ AsyncBufReadExt, BufReader };
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

use cli::Args;
use settings::Settings;

use rotaplay_core::{
    command::{ self, Command },
    MediaCollector, MediaList, PlaylistHandle, PlaylistService,
};


/// Installs the stderr log subscriber.
///
/// `RUST_LOG` wins over the settings filter; `--verbose` forces debug.
fn init_logging( settings: &Settings, verbose: bool ) -> Result<()> {
    let filter = if verbose {
        EnvFilter::new( "debug" )
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else( |_| EnvFilter::new( &settings.log_filter ) )
    };

    tracing_subscriber::fmt()
        .with_writer( io::stderr )
        .with_target( false )
        .with_env_filter( filter )
        .try_init()
        .map_err( |e| anyhow::anyhow!( e ) )
}


/// Writes a path, or a marker when nothing is available.
fn write_entry( out: &mut impl Write, entry: Option<&Path> ) -> io::Result<()> {
    match entry {
        Some( path ) => writeln!( out, "{}", path.display() ),
        None => writeln!( out, "(nothing queued)" ),
    }
}


/// Runs one command against the playlist.
///
/// @returns false when the command asks to quit
async fn execute( handle: &PlaylistHandle, cmd: &Command, out: &mut impl Write ) -> Result<bool> {
    tracing::debug!( "{}", cmd.description() );

    match cmd {
        Command::Current => {
            let current = handle.current().await?;
            write_entry( out, Some( current.as_path() ) )?;
        }
        Command::Peek => {
            let next = handle.peek_next().await?;
            write_entry( out, next.as_deref() )?;
        }
        Command::Next => {
            let next = handle.advance().await?;
            write_entry( out, next.as_deref() )?;
        }
        Command::List => {
            for ( i, path ) in handle.all().await?.iter().enumerate() {
                writeln!( out, "{:>4}  {}", i + 1, path.display() )?;
            }
        }
        Command::Upcoming { count } => {
            for path in handle.upcoming( *count ).await? {
                writeln!( out, "{}", path.display() )?;
            }
        }
        Command::Help => writeln!( out, "{}", command::help_text() )?,
        Command::Quit => return Ok( false ),
    }

    Ok( true )
}


/// Reads commands from stdin until `quit` or end of input.
async fn interactive( handle: PlaylistHandle ) -> Result<()> {
    let mut lines = BufReader::new( tokio::io::stdin() ).lines();
    let mut stdout = io::stdout();

    let current = handle.current().await?;
    write_entry( &mut stdout, Some( current.as_path() ) )?;

    while let Some( line ) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        match Command::parse( &line ) {
            Ok( cmd ) => {
                if !execute( &handle, &cmd, &mut stdout ).await? {
                    break;
                }
            }
            Err( e ) => eprintln!( "{}", e ),
        }
        stdout.flush()?;
    }

    Ok(())
}


/// Steps through `count` items, holding each for `interval`.
///
/// A preloader task follows along and looks up the item after the one
/// being played.
async fn play( handle: PlaylistHandle, count: usize, interval: Duration ) -> Result<()> {
    let ( playing_tx, mut playing_rx ) = watch::channel( handle.current().await? );

    let preloader = {
        let handle = handle.clone();
        tokio::spawn( async move {
            loop {
                let playing = playing_rx.borrow_and_update().clone();
                match handle.peek_next().await {
                    Ok( Some( next ) ) => tracing::info!( "Preloading {:?} (after {:?})", next, playing ),
                    Ok( None ) => tracing::debug!( "Nothing to preload after {:?}", playing ),
                    Err( e ) => {
                        tracing::warn!( "Preloader stopped: {}", e );
                        break;
                    }
                }
                if playing_rx.changed().await.is_err() {
                    break;
                }
            }
        })
    };

    let mut stdout = io::stdout();
    for played in 0..count {
        let current = playing_tx.borrow().clone();
        write_entry( &mut stdout, Some( current.as_path() ) )?;
        stdout.flush()?;

        tokio::time::sleep( interval ).await;

        if played + 1 < count {
            if let Some( next ) = handle.advance().await? {
                playing_tx.send_replace( next );
            }
        }
    }

    drop( playing_tx );
    preloader.await.context( "Preloader task failed" )?;
    Ok(())
}


#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let settings_path = args.config.clone().or_else( Settings::default_path );
    let loaded = match &settings_path {
        Some( path ) => Settings::load_from( path ),
        None => Ok( Settings::default() ),
    };
    let settings = loaded.as_ref().ok().cloned().unwrap_or_default();

    init_logging( &settings, args.verbose )?;
    if let Err( e ) = &loaded {
        tracing::warn!( "Using default settings: {:#}", e );
    }

    let mut extensions = settings.media_extensions();
    for ext in &args.ext {
        extensions.insert( ext );
    }
    let order = args.order.unwrap_or( settings.order );

    // The walk is blocking filesystem work; keep it off the runtime threads.
    let collector = MediaCollector::new( extensions );
    tracing::debug!( "Recognized extensions: {:?}", collector.extensions().iter().collect::<Vec<_>>() );
    let root = args.root.clone();
    let paths = tokio::task::spawn_blocking( move || collector.collect( &root ) )
        .await?
        .with_context( || format!( "Failed to scan {}", args.root.display() ) )?;

    let list = MediaList::new( paths, order.into_strategy() )
        .with_context( || format!( "No playable media under {}", args.root.display() ) )?;
    tracing::info!( "Playlist ready: {} items, {} order", list.len(), order );

    let handle = PlaylistService::spawn( list );

    match args.play {
        Some( count ) => play( handle, count, Duration::from_millis( args.interval ) ).await,
        None => interactive( handle ).await,
    }
}


#[cfg( test )]
mod tests {
    use super::*;

    use std::path::PathBuf;

    use rotaplay_core::KeepOrder;


    fn spawn_keep( names: &[&str] ) -> PlaylistHandle {
        let list = MediaList::new( names.iter().map( PathBuf::from ), Box::new( KeepOrder ) ).unwrap();
        PlaylistService::spawn( list )
    }


    async fn run( handle: &PlaylistHandle, line: &str ) -> ( bool, String ) {
        let cmd = Command::parse( line ).unwrap();
        let mut out = Vec::new();
        let keep_going = execute( handle, &cmd, &mut out ).await.unwrap();
        ( keep_going, String::from_utf8( out ).unwrap() )
    }


    #[tokio::test]
    async fn test_execute_navigation() {
        let handle = spawn_keep( &[ "a.mp4", "b.mp4" ] );

        assert_eq!( run( &handle, "current" ).await, ( true, "a.mp4\n".to_string() ) );
        assert_eq!( run( &handle, "peek" ).await, ( true, "b.mp4\n".to_string() ) );
        assert_eq!( run( &handle, "next" ).await, ( true, "b.mp4\n".to_string() ) );
        assert_eq!( run( &handle, "next" ).await, ( true, "a.mp4\n".to_string() ) );
    }


    #[tokio::test]
    async fn test_execute_listing() {
        let handle = spawn_keep( &[ "a.mp4", "b.mp4" ] );

        let ( _, list ) = run( &handle, "list" ).await;
        assert_eq!( list, "   1  a.mp4\n   2  b.mp4\n" );

        let ( _, upcoming ) = run( &handle, "up 3" ).await;
        assert_eq!( upcoming, "b.mp4\na.mp4\nb.mp4\n" );
    }


    #[tokio::test]
    async fn test_execute_quit() {
        let handle = spawn_keep( &[ "a.mp4" ] );
        let ( keep_going, out ) = run( &handle, "quit" ).await;
        assert!( !keep_going );
        assert!( out.is_empty() );
    }


    #[test]
    fn test_write_entry_marker() {
        let mut out = Vec::new();
        write_entry( &mut out, None ).unwrap();
        assert_eq!( out, b"(nothing queued)\n" );
    }
}
