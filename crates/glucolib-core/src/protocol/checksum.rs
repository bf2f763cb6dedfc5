//! XOR checksum used by the Gold binary protocol

/// Running XOR of every byte in `data`
pub fn checksum(data: &[u8]) -> u8 {
    data.iter().fold(0, |acc, b| acc ^ b)
}
