use file_tail::{TailEvent, TailOptions, follow};
use std::io::Write;
use std::time::Duration;
use tokio_stream::StreamExt;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Tail a scratch file that a background task keeps appending to.
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("demo.log");
    std::fs::write(&path, b"")?;

    let writer_path = path.clone();
    tokio::spawn(async move {
        for i in 1..=5 {
            tokio::time::sleep(Duration::from_millis(200)).await;
            if let Ok(mut file) = std::fs::OpenOptions::new().append(true).open(&writer_path) {
                let _ = writeln!(file, "log line {}", i);
            }
        }
    });

    let options = TailOptions {
        poll_interval: Duration::from_millis(100),
        ..TailOptions::default()
    };
    let (tail, mut events) = follow(&path, options)?;

    println!("Following {} - emitting appended chunks...", path.display());

    let mut received = 0;
    while received < 5 {
        match tokio::time::timeout(Duration::from_secs(5), events.next()).await {
            Ok(Some(TailEvent::Data { text, bytes })) => {
                received += text.matches('\n').count();
                print!("{} byte chunk: {}", bytes, text);
            }
            Ok(Some(TailEvent::Error(e))) => {
                eprintln!("Error: {}", e);
                break;
            }
            Ok(Some(_)) => {}
            Ok(None) | Err(_) => break,
        }
    }

    tail.close();
    Ok(())
}
