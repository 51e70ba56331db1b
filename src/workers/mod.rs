pub mod ad_worker;
