//! Synthetic chunked-jsonl bundle generator for stress testing chunkpack.
//!
//! Usage: cargo run --features gen-test --bin gen_bundle -- [messages] [output_dir] [per_chunk]
//! Example: cargo run --features gen-test --bin gen_bundle -- 200000 heavy_bundle 50000

use std::env;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::Path;

use rand::Rng;
use rand::seq::SliceRandom;
use serde_json::{Value, json};

const SENDERS: &[(&str, &str, &str)] = &[
    ("10001", "Alice", "群主"),
    ("10002", "Bob", ""),
    ("10003", "村上", "村上春树"),
    ("10004", "Иван", ""),
    ("10005", "🔥FireUser🔥", "火"),
    ("10006", "User\"With\"Quotes", ""),
];

const TEXTS: &[&str] = &[
    "hello",
    "早上好",
    "[图片]",
    "Alice发出了红包，请使用新版手机QQ查收",
    "向你转账 88.00 元",
    "Bob 拍了拍 Alice",
    "通话时长 01:02",
    "[音乐]",
    "[链接]",
    "[地理位置]",
    "[聊天记录]",
    "multi\nline\nmessage",
    "",
];

const RESOURCES: &[&str] = &["image", "video", "voice", "audio", "file", "location", "hologram"];

const PNG: &str = "data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNk+M9QDwADhgGAWjR9awAAAABJRU5ErkJggg==";

fn main() -> io::Result<()> {
    let args: Vec<String> = env::args().collect();

    let count: usize = args.get(1).and_then(|s| s.parse().ok()).unwrap_or(100_000);
    let output = args.get(2).map(|s| s.as_str()).unwrap_or("heavy_bundle");
    let per_chunk: usize = args
        .get(3)
        .and_then(|s| s.parse().ok())
        .filter(|&n| n > 0)
        .unwrap_or(50_000);

    println!("🧪 Bundle Generator");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("   Messages:  {}", count);
    println!("   Output:    {}", output);
    println!("   Per chunk: {}", per_chunk);
    println!();

    let start = std::time::Instant::now();
    let bytes_written = generate(Path::new(output), count, per_chunk)?;
    let elapsed = start.elapsed();
    let mb = bytes_written as f64 / 1_000_000.0;

    println!("\n\n✅ Done!");
    println!("   Size: {:.2} MB", mb);
    println!("   Time: {:.2}s", elapsed.as_secs_f64());
    Ok(())
}

fn generate(root: &Path, count: usize, per_chunk: usize) -> io::Result<usize> {
    let chunks_dir = root.join("chunks");
    fs::create_dir_all(&chunks_dir)?;

    let mut rng = rand::thread_rng();
    let mut entries = Vec::new();
    let mut bytes_written = 0usize;
    let mut written = 0usize;

    while written < count {
        let index = entries.len() + 1;
        let file_name = format!("chunk_{index:04}.jsonl");
        let file = File::create(chunks_dir.join(&file_name))?;
        let mut writer = BufWriter::with_capacity(1024 * 1024, file);

        let in_chunk = per_chunk.min(count - written);
        for i in 0..in_chunk {
            let line = if rng.gen_bool(0.001) {
                // truncated line, must be dropped by the reader
                "{\"id\":\"broken\",\"sender\":{\"ui".to_string()
            } else {
                record(&mut rng, written + i).to_string()
            };
            bytes_written += line.len() + 1;
            writeln!(writer, "{line}")?;
        }
        writer.flush()?;
        written += in_chunk;

        entries.push(json!({
            "index": index,
            "fileName": file_name,
            "relativePath": format!("chunks/{file_name}"),
            "count": in_chunk,
        }));
        eprint!("\r   Generated {}/{} ({} chunks)", written, count, entries.len());
    }

    let avatars: serde_json::Map<String, Value> = SENDERS
        .iter()
        .step_by(2)
        .map(|(uin, _, _)| ((*uin).to_string(), Value::from(PNG)))
        .collect();
    fs::write(root.join("avatars.json"), Value::Object(avatars).to_string())?;

    let manifest = json!({
        "metadata": {
            "name": "QQ Chat Exporter",
            "exportTime": "2024-06-01T10:00:00Z",
            "version": "5.5.0",
            "format": "chunked-jsonl"
        },
        "chatInfo": {"name": "Stress Test Group", "type": "group", "selfUid": "u_10001", "selfUin": "10001"},
        "statistics": {"totalMessages": count},
        "chunked": {
            "format": "jsonl",
            "chunksDir": "chunks",
            "chunkFileExt": ".jsonl",
            "maxMessagesPerChunk": per_chunk,
            "chunks": entries
        },
        "avatars": {"file": "avatars.json", "count": SENDERS.len().div_ceil(2)}
    });
    let manifest = serde_json::to_string_pretty(&manifest).map_err(io::Error::other)?;
    fs::write(root.join("manifest.json"), manifest)?;

    Ok(bytes_written)
}

fn record(rng: &mut impl Rng, i: usize) -> Value {
    let (uin, nickname, card) = SENDERS.choose(rng).copied().unwrap_or(SENDERS[0]);
    // a few unattributable senders
    let uin = if rng.gen_bool(0.002) { "0" } else { uin };
    let timestamp = 1_700_000_000_000_i64 + (i as i64) * 1_000;
    let msg_type = if rng.gen_bool(0.01) { "system" } else { "text" };

    let mut resources = Vec::new();
    if rng.gen_bool(0.1) {
        let kind = RESOURCES.choose(rng).copied().unwrap_or("image");
        resources.push(json!({"type": kind, "filename": format!("{i}.bin")}));
    }
    let mut elements = vec![json!({"type": "text", "data": {"text": "x"}})];
    if rng.gen_bool(0.05) {
        elements.push(json!({"type": "face", "data": {"id": rng.gen_range(0..300)}}));
    }

    json!({
        "id": format!("m{i}"),
        "seq": (i + 1).to_string(),
        "timestamp": timestamp,
        "sender": {"uid": format!("u_{uin}"), "uin": uin, "name": nickname, "nickname": nickname, "groupCard": card},
        "type": msg_type,
        "content": {
            "text": TEXTS.choose(rng).copied().unwrap_or(""),
            "elements": elements,
            "resources": resources,
            "mentions": []
        },
        "recalled": rng.gen_bool(0.01),
        "system": false
    })
}
