pub mod netblock;
