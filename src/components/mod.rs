pub mod topology_view;
