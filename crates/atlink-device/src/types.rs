use serde::Serialize;

/// PDP context definition as reported by `AT+CGDCONT?`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Apn {
    pub context_id: u32,
    pub pdp_type: String,
    pub name: String,
    pub address: String,
}

/// Address allocated to a PDP context, as reported by `AT+CGPADDR`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PdpAddress {
    pub context_id: u32,
    pub address: String,
}

/// Operational statistics. Fields the module does not report stay zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Stats {
    /// Tenths of dBm.
    pub signal_power: i32,
    /// Total power within receive bandwidth, tenths of dBm.
    pub total_power: i32,
    /// Tenths of dBm.
    pub tx_power: i32,
    /// Milliseconds since power on.
    pub tx_time: i64,
    /// Milliseconds since power on.
    pub rx_time: i64,
    pub cell_id: i64,
    /// Coverage enhancement level.
    pub ecl: i32,
    /// Tenths of dB.
    pub snr: i32,
    pub earfcn: i32,
    pub pci: i32,
    pub rsrq: i32,
}

/// One datagram read from a module socket.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReceivedData {
    pub socket: u32,
    pub ip: String,
    pub port: u16,
    pub length: usize,
    #[serde(serialize_with = "serialize_hex")]
    pub data: Vec<u8>,
    /// Bytes of the datagram still unread on the module.
    pub remaining: usize,
}

fn serialize_hex<S: serde::Serializer>(data: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&hex::encode(data))
}
