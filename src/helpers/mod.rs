pub mod scan_helpers;
