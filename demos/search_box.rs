use std::time::Duration;

use futures::StreamExt;
use settle::{DebounceOptions, Debouncer};
use tokio::time::sleep;

// Simulated keystrokes: (text after the key, pause before the next key).
const TYPING: &[(&str, u64)] = &[
    ("r", 40),
    ("ru", 60),
    ("rus", 50),
    ("rust", 400),
    ("rust a", 30),
    ("rust as", 20),
    ("rust asy", 45),
    ("rust async", 0),
];

#[tokio::main]
async fn main() {
    let query = Debouncer::with_options(
        String::new(),
        Duration::from_millis(200),
        DebounceOptions::new(),
    );
    let mut searches = query.changes();

    tokio::spawn(async move {
        while let Some(text) = searches.next().await {
            println!("searching for {text:?}");
        }
        println!("search box closed");
    });

    for (text, pause) in TYPING {
        println!("typed {text:?}");
        query.set_value(text.to_string());
        sleep(Duration::from_millis(*pause)).await;
    }

    // Enter key: search right away instead of waiting out the delay.
    query.flush();
    sleep(Duration::from_millis(50)).await;
    drop(query);
    sleep(Duration::from_millis(50)).await;
}
