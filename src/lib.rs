pub mod demo;
pub mod error;
pub mod net;
pub mod session;
pub mod sim;
pub mod traffic;
pub mod viz;

#[cfg(test)]
mod test;
