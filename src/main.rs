use file_tail::{follow, TailEvent, TailOptions};
use std::env;
use std::process;
use tokio_stream::StreamExt;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = env::args().collect();

    if args.len() != 2 {
        eprintln!("Usage: {} <file_path>", args[0]);
        process::exit(1);
    }

    let file_path = &args[1];

    let (tail, mut events) = match follow(file_path, TailOptions::default()) {
        Ok(session) => session,
        Err(e) => {
            eprintln!("Error setting up tail session: {}", e);
            process::exit(1);
        }
    };

    eprintln!("Following file: {}", file_path);
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tail.close();
            }
            event = events.next() => match event {
                Some(TailEvent::Data { text, .. }) => print!("{text}"),
                Some(TailEvent::Error(e)) => {
                    eprintln!("Error while tailing: {}", e);
                }
                Some(TailEvent::End) | None => break,
                Some(_) => {}
            },
        }
    }
}
