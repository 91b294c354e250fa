pub mod fixture;
pub mod keygen;
pub mod prove;
pub mod verify;
pub mod verify_event;
