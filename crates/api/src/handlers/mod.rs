pub mod prime;
