use anyhow::{Context, Result};
use rosc::{encoder, OscMessage, OscPacket, OscType};
use std::net::UdpSocket;
use tracing::debug;

use crate::config::OscConfig;
use crate::instrument::StrumSink;

/// ストロークのOSCメッセージを構築
/// 引数: pitch_offset (int, 半音)
pub fn build_strum_message(address: &str, pitch_offset: i32) -> OscMessage {
    OscMessage {
        addr: address.to_string(),
        args: vec![OscType::Int(pitch_offset)],
    }
}

/// OSCメッセージをバイト列にエンコード
pub fn encode_osc_message(msg: &OscMessage) -> Result<Vec<u8>> {
    let packet = OscPacket::Message(msg.clone());
    let encoded = encoder::encode(&packet)?;
    Ok(encoded)
}

/// UDP で音源へストロークを送るクライアント
pub struct OscStrumSink {
    socket: UdpSocket,
    target_addr: String,
    address: String,
}

impl OscStrumSink {
    pub fn new(target_addr: &str, address: &str) -> Result<Self> {
        let socket = UdpSocket::bind("0.0.0.0:0").context("Failed to bind UDP socket")?;
        Ok(Self {
            socket,
            target_addr: target_addr.to_string(),
            address: address.to_string(),
        })
    }

    pub fn from_config(config: &OscConfig) -> Result<Self> {
        Self::new(&config.addr, &config.address)
    }

    pub fn target_addr(&self) -> &str {
        &self.target_addr
    }

    /// ストロークを送信
    pub fn send(&self, pitch_offset: i32) -> Result<()> {
        let msg = build_strum_message(&self.address, pitch_offset);
        let data = encode_osc_message(&msg)?;
        self.socket
            .send_to(&data, &self.target_addr)
            .with_context(|| format!("Failed to send to {}", self.target_addr))?;
        debug!(pitch_offset, target = %self.target_addr, "osc strum sent");
        Ok(())
    }
}

impl StrumSink for OscStrumSink {
    fn on_strum(&mut self, pitch_offset: i32) -> Result<()> {
        self.send(pitch_offset)
    }
}
