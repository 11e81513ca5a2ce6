//! Host-based tests for the OTA Hub update flow
//! These tests run on the development machine, not on the ESP32
