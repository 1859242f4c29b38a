//! Response bookkeeping: correlating outbound commands with their responses
//! and reassembling responses the server split across several datagrams.

pub mod correlation;
pub mod reassembly;
