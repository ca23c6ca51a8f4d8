pub mod otp_records;
