pub mod cayenne;
