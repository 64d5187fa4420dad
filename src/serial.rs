use rppal::uart::{Parity, Uart};
use std::sync::mpsc::SyncSender;
use std::thread;
use std::time::Duration;

const LINE_MAX: usize = 256;

/// Reads the perception peer's UART and forwards complete trimmed lines.
/// The queue is bounded and sends are try_send: when the control cycle lags,
/// stale deviations are dropped rather than queued up.
pub fn serial_thread(path: String, baud: u32, tx: SyncSender<String>) {
    loop {
        let mut uart = match Uart::with_path(&path, baud, Parity::None, 8, 1) {
            Ok(u) => u,
            Err(e) => {
                eprintln!("[SERIAL] open {} failed: {}", path, e);
                thread::sleep(Duration::from_secs(5));
                continue;
            }
        };

        if let Err(e) = uart.set_read_mode(1, Duration::from_millis(100)) {
            eprintln!("[SERIAL] read mode failed: {}", e);
            thread::sleep(Duration::from_secs(5));
            continue;
        }

        println!("[SERIAL] listening on {} at {} baud", path, baud);

        let mut line = String::new();
        let mut buffer = [0u8; 64];

        loop {
            match uart.read(&mut buffer) {
                Ok(0) => {}
                Ok(n) => {
                    for &byte in &buffer[..n] {
                        if byte == b'\n' {
                            let message = line.trim().to_string();
                            line.clear();
                            if !message.is_empty() {
                                let _ = tx.try_send(message);
                            }
                        } else if line.len() < LINE_MAX {
                            line.push(byte as char);
                        }
                    }
                }
                Err(e) => {
                    eprintln!("[SERIAL] read error: {}", e);
                    break;
                }
            }
        }

        thread::sleep(Duration::from_secs(1));
    }
}
