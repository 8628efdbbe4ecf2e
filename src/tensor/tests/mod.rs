mod conv;
