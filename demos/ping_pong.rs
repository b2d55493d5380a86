//! Simple ping-pong exchange over an in-memory stream

use std::io::Cursor;

use btcwire::message::{MsgPing, MsgPong};
use btcwire::{Codec, CodecConfig, Message, NetworkId};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("btcwire Ping-Pong Example");
    println!("=========================\n");

    let codec = Codec::new(CodecConfig::default().with_network(NetworkId::TEST_NET3));

    // Send a ping
    let mut wire = Vec::new();
    let written = codec.write_n(&mut wire, &MsgPing::new(0x5EED))?;
    println!("Wrote ping: {written} bytes on {}", codec.config().network);

    // Peer reads it and answers
    let (read, msg, _) = codec.read_n(&mut Cursor::new(&wire))?;
    println!("Read {read} bytes: {}", msg.kind());

    let Message::Ping(ping) = msg else {
        return Err("expected a ping".into());
    };

    let mut reply = Vec::new();
    codec.write(&mut reply, &MsgPong::new(ping.nonce))?;
    let pong = codec.read(&mut Cursor::new(&reply))?;
    println!("Answered with {pong:?}");

    Ok(())
}
