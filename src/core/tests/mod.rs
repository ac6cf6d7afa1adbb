mod pin_validator_tests;
