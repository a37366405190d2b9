mod capture_decoder;
